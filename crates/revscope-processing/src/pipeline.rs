//! One review-table pipeline, parameterized by [`SiteProfile`].
//!
//! load → clean → derive → embed → persist. Every stage degrades to an empty
//! or partial result with a log line instead of failing the run.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use revscope_core::{NormalizedRecord, PipelineConfig, RawRecord, ReviewSite, SiteProfile};
use revscope_scraper::{extract, Deduplicator, ExtractContext, RejectionCounts};

use crate::error::ProcessingError;
use crate::table::{self, RawTable};
use crate::tfidf::{EmbeddingMatrix, TfidfVectorizer};

/// Columns the pipeline itself produces. They are never carried through as
/// extras, so re-processing an output table does not duplicate them.
pub const DERIVED_COLUMNS: &[&str] = &["content_length", "is_positive", "month", "weekday"];

/// A validated record plus the untouched extra cells of its source row.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRow {
    pub record: NormalizedRecord,
    pub extras: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub input_rows: usize,
    pub kept: usize,
    pub duplicates: usize,
    pub rejections: RejectionCounts,
    /// Required columns absent from the input header.
    pub missing_columns: Vec<String>,
}

impl CleanReport {
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.duplicates + self.rejections.total()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanOutput {
    pub extra_columns: Vec<String>,
    pub rows: Vec<CleanRow>,
    pub report: CleanReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    pub month: u32,
    pub weekday: Weekday,
}

impl CalendarFeatures {
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            weekday: date.weekday(),
        }
    }
}

/// Full English day name, `Monday` through `Sunday`.
#[must_use]
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub record: NormalizedRecord,
    pub extras: Vec<Option<String>>,
    pub calendar: Option<CalendarFeatures>,
}

/// The terminal in-memory artifact of a run, in scrape order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewTable {
    pub extra_columns: Vec<String>,
    pub rows: Vec<ReviewRow>,
    pub calendar_features: bool,
}

impl ReviewTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `rating,date,content,<extras…>,content_length,is_positive[,month,weekday]`
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = ["rating", "date", "content"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        headers.extend(self.extra_columns.iter().cloned());
        headers.push("content_length".to_string());
        headers.push("is_positive".to_string());
        if self.calendar_features {
            headers.push("month".to_string());
            headers.push("weekday".to_string());
        }
        headers
    }

    fn cells(&self, row: &ReviewRow) -> Vec<String> {
        let r = &row.record;
        let mut cells = vec![format_rating(r.rating), r.date_iso(), r.content.clone()];
        cells.extend(row.extras.iter().map(|c| c.clone().unwrap_or_default()));
        cells.push(r.content_length.to_string());
        cells.push(if r.is_positive { "1" } else { "0" }.to_string());
        if self.calendar_features {
            match row.calendar {
                Some(cal) => {
                    cells.push(cal.month.to_string());
                    cells.push(weekday_name(cal.weekday).to_string());
                }
                None => {
                    cells.push(String::new());
                    cells.push(String::new());
                }
            }
        }
        cells
    }
}

/// Integral ratings render without a fraction (`5`), others as decimals (`4.5`).
#[must_use]
pub fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{rating:.0}")
    } else {
        rating.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub table_path: Option<PathBuf>,
    pub embeddings_path: Option<PathBuf>,
    pub rows_written: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub site: ReviewSite,
    pub input: PathBuf,
    pub clean: CleanReport,
    pub rows: usize,
    pub embedding_terms: Option<usize>,
    pub persist: PersistReport,
}

/// Processes review tables for one site.
#[derive(Debug, Clone)]
pub struct SiteProcessor {
    profile: SiteProfile,
    config: PipelineConfig,
    today: NaiveDate,
}

impl SiteProcessor {
    #[must_use]
    pub fn new(profile: SiteProfile, config: PipelineConfig) -> Self {
        Self {
            profile,
            config,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Pins the date relative phrases ("3 days ago") resolve against.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    #[must_use]
    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    #[must_use]
    pub fn load(&self, path: &Path) -> RawTable {
        let table = table::load(path);
        tracing::info!(
            site = %self.profile.site,
            path = %path.display(),
            rows = table.len(),
            "loaded input table"
        );
        table
    }

    /// Validates, normalizes and de-duplicates rows, keeping the first of
    /// each duplicate group in input order.
    #[must_use]
    pub fn clean(&self, raw: &RawTable) -> CleanOutput {
        let site = self.profile.site;
        let mut report = CleanReport {
            input_rows: raw.len(),
            ..CleanReport::default()
        };

        let columns = &self.profile.columns;
        let (rating_idx, date_idx, content_idx) = match (
            raw.column_index(&columns.rating),
            raw.column_index(&columns.date),
            raw.column_index(&columns.content),
        ) {
            (Some(r), Some(d), Some(c)) => (r, d, c),
            (r, d, c) => {
                report.missing_columns = [
                    (r, &columns.rating),
                    (d, &columns.date),
                    (c, &columns.content),
                ]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, name)| name.clone())
                .collect();
                // An empty header is the load failure already reported.
                if !raw.headers().is_empty() {
                    tracing::error!(
                        site = %site,
                        missing = ?report.missing_columns,
                        "input table is missing required columns"
                    );
                }
                return CleanOutput {
                    report,
                    ..CleanOutput::default()
                };
            }
        };

        let extra_idx: Vec<usize> = raw
            .headers()
            .iter()
            .enumerate()
            .filter(|(i, name)| {
                ![rating_idx, date_idx, content_idx].contains(i)
                    && !DERIVED_COLUMNS.contains(&name.as_str())
            })
            .map(|(i, _)| i)
            .collect();
        let extra_columns = extra_idx.iter().map(|&i| raw.headers()[i].clone()).collect();

        let ctx = ExtractContext::for_profile(&self.profile, &self.config, self.today);
        let mut dedup = Deduplicator::new(self.config.dedup_prefix_chars);
        let mut rows = Vec::new();

        for cells in raw.rows() {
            let record = RawRecord {
                rating: cells[rating_idx].clone(),
                date: cells[date_idx].clone(),
                content: cells[content_idx].clone(),
            };
            match extract(&record, &ctx) {
                Ok(record) => {
                    if dedup.is_duplicate(&record) {
                        report.duplicates += 1;
                        continue;
                    }
                    rows.push(CleanRow {
                        record,
                        extras: extra_idx.iter().map(|&i| cells[i].clone()).collect(),
                    });
                }
                Err(rejection) => {
                    tracing::debug!(site = %site, reason = %rejection, "row dropped");
                    report.rejections.record(&rejection);
                }
            }
        }

        report.kept = rows.len();
        let r = &report.rejections;
        tracing::info!(
            site = %site,
            input = report.input_rows,
            kept = report.kept,
            duplicates = report.duplicates,
            missing_field = r.missing_field,
            bad_rating = r.bad_rating,
            rating_out_of_range = r.rating_out_of_range,
            bad_date = r.bad_date,
            content_too_short = r.content_too_short,
            "cleaned table"
        );

        CleanOutput {
            extra_columns,
            rows,
            report,
        }
    }

    #[must_use]
    pub fn derive(&self, cleaned: &CleanOutput) -> ReviewTable {
        let calendar_features = self.profile.calendar_features;
        ReviewTable {
            extra_columns: cleaned.extra_columns.clone(),
            rows: cleaned
                .rows
                .iter()
                .map(|row| ReviewRow {
                    record: row.record.clone(),
                    extras: row.extras.clone(),
                    calendar: calendar_features
                        .then(|| CalendarFeatures::from_date(row.record.date)),
                })
                .collect(),
            calendar_features,
        }
    }

    /// TF-IDF over cleaned content. `None` when disabled for the site, when
    /// the table is empty, or when no document yields a single term.
    #[must_use]
    pub fn embed(&self, table: &ReviewTable) -> Option<EmbeddingMatrix> {
        if !self.profile.embeddings || table.is_empty() {
            return None;
        }
        let docs: Vec<&str> = table.rows.iter().map(|r| r.record.content.as_str()).collect();
        let matrix = TfidfVectorizer::new(self.config.max_features).fit_transform(&docs);
        if matrix.n_terms() == 0 {
            tracing::warn!(site = %self.profile.site, "no terms in corpus; skipping embeddings");
            return None;
        }
        tracing::info!(
            site = %self.profile.site,
            rows = matrix.n_rows(),
            terms = matrix.n_terms(),
            "computed TF-IDF embeddings"
        );
        Some(matrix)
    }

    /// Writes the table (and matrix, if any) under the configured output
    /// directory. `base` is the input file stem.
    ///
    /// Failures are logged with the attempted path and leave the
    /// corresponding report field `None`.
    #[must_use]
    pub fn persist(
        &self,
        base: &str,
        table: &ReviewTable,
        matrix: Option<&EmbeddingMatrix>,
    ) -> PersistReport {
        let site = self.profile.site;
        let mut report = PersistReport::default();

        if table.is_empty() {
            tracing::warn!(site = %site, "no rows left after cleaning; nothing written");
            return report;
        }

        let dir = &self.config.output_dir;
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!(site = %site, path = %dir.display(), error = %e, "failed to create output directory");
            return report;
        }

        let table_path = dir.join(self.profile.output_naming.table_file_name(base));
        match write_table(&table_path, table) {
            Ok(()) => {
                tracing::info!(site = %site, path = %table_path.display(), rows = table.len(), "wrote table");
                report.rows_written = table.len();
                report.table_path = Some(table_path);
            }
            Err(e) => {
                tracing::error!(site = %site, path = %table_path.display(), error = %e, "failed to write table");
            }
        }

        if let Some(matrix) = matrix {
            let path = dir.join(format!("{base}_tfidf_embeddings.csv"));
            match write_embeddings(&path, matrix) {
                Ok(()) => {
                    tracing::info!(site = %site, path = %path.display(), terms = matrix.n_terms(), "wrote embeddings");
                    report.embeddings_path = Some(path);
                }
                Err(e) => {
                    tracing::error!(site = %site, path = %path.display(), error = %e, "failed to write embeddings");
                }
            }
        }

        report
    }

    /// Runs every stage over one input file.
    #[must_use]
    pub fn run(&self, input: &Path) -> RunSummary {
        let base = input.file_stem().map_or_else(
            || self.profile.site.as_str().to_string(),
            |s| s.to_string_lossy().into_owned(),
        );

        let raw = self.load(input);
        let cleaned = self.clean(&raw);
        let table = self.derive(&cleaned);
        let matrix = self.embed(&table);
        let persist = self.persist(&base, &table, matrix.as_ref());

        RunSummary {
            site: self.profile.site,
            input: input.to_path_buf(),
            clean: cleaned.report,
            rows: table.len(),
            embedding_terms: matrix.as_ref().map(EmbeddingMatrix::n_terms),
            persist,
        }
    }
}

/// Writes a review table in the output layout.
///
/// # Errors
///
/// Returns [`ProcessingError`] naming `path` if the file cannot be written.
pub fn write_table(path: &Path, table: &ReviewTable) -> Result<(), ProcessingError> {
    table::write_csv(
        path,
        table.headers(),
        table.rows.iter().map(|row| table.cells(row)),
    )
}

/// Writes an embedding matrix: header of terms, one row per document.
///
/// # Errors
///
/// Returns [`ProcessingError`] naming `path` if the file cannot be written.
pub fn write_embeddings(path: &Path, matrix: &EmbeddingMatrix) -> Result<(), ProcessingError> {
    table::write_csv(
        path,
        &matrix.terms,
        matrix
            .rows
            .iter()
            .map(|row| row.iter().map(f64::to_string).collect::<Vec<_>>()),
    )
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
