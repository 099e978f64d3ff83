//! Exploratory charts for processed review tables.
//!
//! Each chart is written as `<input stem>_<chart>.png` with its data in a
//! companion `<input stem>_<chart>.csv`. Embedding matrices are summarized by
//! [`crate::embedding_eda`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::chart::{emit, Orientation, Series};
use crate::error::ProcessingError;
use crate::table::{read_table, RawTable};

pub const DEFAULT_OUTPUT_DIR: &str = "review_analysis/plot";
const LENGTH_BINS: usize = 50;
const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Charts derivable from a processed review table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableChart {
    RatingDistribution,
    ContentLengthDistribution,
    ReviewsByMonth,
    ReviewsByWeekday,
}

impl TableChart {
    pub const ALL: [TableChart; 4] = [
        TableChart::RatingDistribution,
        TableChart::ContentLengthDistribution,
        TableChart::ReviewsByMonth,
        TableChart::ReviewsByWeekday,
    ];

    #[must_use]
    pub fn file_suffix(self) -> &'static str {
        match self {
            TableChart::RatingDistribution => "rating_distribution",
            TableChart::ContentLengthDistribution => "content_length_distribution",
            TableChart::ReviewsByMonth => "reviews_by_month",
            TableChart::ReviewsByWeekday => "reviews_by_weekday",
        }
    }

    fn source_column(self) -> &'static str {
        match self {
            TableChart::RatingDistribution => "rating",
            TableChart::ContentLengthDistribution => "content_length",
            TableChart::ReviewsByMonth => "month",
            TableChart::ReviewsByWeekday => "weekday",
        }
    }

    fn label_header(self) -> &'static str {
        match self {
            TableChart::ContentLengthDistribution => "bin_start",
            other => other.source_column(),
        }
    }
}

impl FromStr for TableChart {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rating" | "rating_distribution" => Ok(TableChart::RatingDistribution),
            "length" | "content_length" | "content_length_distribution" => {
                Ok(TableChart::ContentLengthDistribution)
            }
            "month" | "reviews_by_month" => Ok(TableChart::ReviewsByMonth),
            "weekday" | "reviews_by_weekday" => Ok(TableChart::ReviewsByWeekday),
            other => Err(ProcessingError::UnknownChart(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdaOptions {
    pub output_dir: PathBuf,
    pub charts: Vec<TableChart>,
    /// Number of terms in the top-term charts.
    pub top_k: usize,
}

impl Default for EdaOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            charts: TableChart::ALL.to_vec(),
            top_k: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdaReport {
    pub written: Vec<PathBuf>,
    /// Outputs not produced, with the reason.
    pub skipped: Vec<String>,
}

/// Writes the selected table charts for one processed table.
///
/// A chart whose source column is absent is skipped with a warning.
///
/// # Errors
///
/// Returns [`ProcessingError`] if the input cannot be read or the output
/// directory cannot be created. Individual chart write failures are logged.
pub fn summarize_table(path: &Path, options: &EdaOptions) -> Result<EdaReport, ProcessingError> {
    let table = read_table(path)?;
    create_dir(&options.output_dir)?;
    let base = path
        .file_stem()
        .map_or_else(|| "input".to_string(), |s| s.to_string_lossy().into_owned());
    let mut report = EdaReport::default();

    for &chart in &options.charts {
        let Some(series) = table_chart(&table, chart) else {
            tracing::warn!(
                input = %path.display(),
                column = chart.source_column(),
                "column missing; chart skipped"
            );
            report.skipped.push(format!(
                "{}: missing column {}",
                chart.file_suffix(),
                chart.source_column()
            ));
            continue;
        };
        let name = format!("{base}_{}", chart.file_suffix());
        emit(&options.output_dir, &name, &series, Orientation::Vertical, &mut report);
    }

    Ok(report)
}

fn table_chart(table: &RawTable, chart: TableChart) -> Option<Series> {
    let values: Vec<&str> = table.column(chart.source_column())?.flatten().collect();
    let points = match chart {
        TableChart::RatingDistribution => rating_distribution(&values),
        TableChart::ContentLengthDistribution => length_histogram(&values, LENGTH_BINS),
        TableChart::ReviewsByMonth => month_counts(&values),
        TableChart::ReviewsByWeekday => weekday_counts(&values),
    };
    Some(Series::counts(chart.label_header(), points))
}

fn rating_distribution(values: &[&str]) -> Vec<(String, usize)> {
    let mut counts: Vec<(f64, String, usize)> = Vec::new();
    for v in values {
        let Ok(rating) = v.trim().parse::<f64>() else {
            continue;
        };
        match counts.iter_mut().find(|(r, _, _)| (*r - rating).abs() < f64::EPSILON) {
            Some(entry) => entry.2 += 1,
            None => counts.push((rating, v.trim().to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| a.0.total_cmp(&b.0));
    counts.into_iter().map(|(_, label, n)| (label, n)).collect()
}

/// Equal-width histogram labelled by bin start; a single distinct value gets
/// a unit-wide range centered on it.
fn length_histogram(values: &[&str], bins: usize) -> Vec<(String, usize)> {
    let lengths: Vec<f64> = values
        .iter()
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .collect();
    let (Some(min), Some(max)) = (
        lengths.iter().copied().reduce(f64::min),
        lengths.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    let (lo, hi) = if (max - min).abs() < f64::EPSILON {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    #[allow(clippy::cast_precision_loss)]
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for len in lengths {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = (((len - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, n)| {
            #[allow(clippy::cast_precision_loss)]
            let start = lo + width * i as f64;
            (format!("{start:.2}"), n)
        })
        .collect()
}

fn month_counts(values: &[&str]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for v in values {
        if let Ok(month) = v.trim().parse::<u32>() {
            if (1..=12).contains(&month) {
                *counts.entry(month).or_default() += 1;
            }
        }
    }
    counts.into_iter().map(|(m, n)| (m.to_string(), n)).collect()
}

fn weekday_counts(values: &[&str]) -> Vec<(String, usize)> {
    WEEKDAYS
        .iter()
        .map(|day| {
            let n = values.iter().filter(|v| v.trim() == *day).count();
            ((*day).to_string(), n)
        })
        .collect()
}

pub(crate) fn create_dir(dir: &Path) -> Result<(), ProcessingError> {
    std::fs::create_dir_all(dir).map_err(|source| ProcessingError::Io {
        path: dir.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "eda_test.rs"]
mod tests;
