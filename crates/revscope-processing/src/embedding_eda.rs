//! Exploratory analysis of TF-IDF embedding matrices.
//!
//! All inputs are summarized in one pass. Each input gets basic matrix stats
//! and two top-term charts; every pair of inputs is compared by vocabulary
//! overlap and by the mean TF-IDF gap on shared terms. The text summary lands
//! in [`REPORT_FILE_NAME`] inside the output directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::chart::{emit, Orientation, Series};
use crate::eda::{create_dir, EdaOptions, EdaReport};
use crate::error::ProcessingError;
use crate::table::{read_table, write_csv};

pub const REPORT_FILE_NAME: &str = "embedding_report.txt";

/// Shared terms listed per pair in the report.
const GAP_TERMS: usize = 25;

static UNSAFE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("valid regex"));

/// File stem with every run of characters outside `[A-Za-z0-9_-]` replaced by
/// a single underscore.
fn safe_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map_or_else(|| "input".to_string(), |s| s.to_string_lossy().into_owned());
    UNSAFE_NAME_RE.replace_all(&stem, "_").into_owned()
}

/// Dense matrix read back from an embeddings file.
#[derive(Debug, Clone, PartialEq)]
struct Matrix {
    terms: Vec<String>,
    rows: Vec<Vec<f64>>,
}

/// Reads a matrix, treating empty, non-numeric and non-finite cells as `0.0`.
/// Returns the matrix and the number of non-empty cells that were coerced.
fn load_matrix(path: &Path) -> Result<(Matrix, usize), ProcessingError> {
    let table = read_table(path)?;
    let mut coerced = 0usize;
    let rows = table
        .rows()
        .iter()
        .map(|cells| {
            cells
                .iter()
                .map(|cell| match cell.as_deref().map(str::trim) {
                    None | Some("") => 0.0,
                    Some(raw) => match raw.parse::<f64>() {
                        Ok(v) if v.is_finite() => v,
                        _ => {
                            coerced += 1;
                            0.0
                        }
                    },
                })
                .collect()
        })
        .collect();
    let matrix = Matrix {
        terms: table.headers().to_vec(),
        rows,
    };
    Ok((matrix, coerced))
}

impl Matrix {
    fn column_means(&self) -> Vec<f64> {
        #[allow(clippy::cast_precision_loss)]
        let n = self.rows.len() as f64;
        (0..self.terms.len())
            .map(|j| self.rows.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect()
    }

    /// Share of documents in which each term is non-zero.
    fn doc_freq_ratio(&self) -> Vec<f64> {
        #[allow(clippy::cast_precision_loss)]
        let n = self.rows.len() as f64;
        (0..self.terms.len())
            .map(|j| {
                #[allow(clippy::cast_precision_loss)]
                let hits = self.rows.iter().filter(|row| row[j] > 0.0).count() as f64;
                hits / n
            })
            .collect()
    }

    /// Mean per term; a repeated header keeps its last column.
    fn term_means(&self) -> BTreeMap<&str, f64> {
        self.terms
            .iter()
            .map(String::as_str)
            .zip(self.column_means())
            .collect()
    }
}

/// Shape and sparsity of one matrix. Ratios are NaN for an empty matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MatrixStats {
    n_docs: usize,
    n_terms: usize,
    /// Share of cells equal to zero.
    sparsity: f64,
    avg_nonzero_terms_per_doc: f64,
    median_nonzero_terms_per_doc: f64,
}

fn basic_stats(matrix: &Matrix) -> MatrixStats {
    let mut nonzero: Vec<usize> = matrix
        .rows
        .iter()
        .map(|row| row.iter().filter(|v| **v != 0.0).count())
        .collect();
    let cells = matrix.rows.len() * matrix.terms.len();
    let total_nonzero: usize = nonzero.iter().sum();

    #[allow(clippy::cast_precision_loss)]
    let sparsity = (cells - total_nonzero) as f64 / cells as f64;
    #[allow(clippy::cast_precision_loss)]
    let avg = total_nonzero as f64 / nonzero.len() as f64;

    nonzero.sort_unstable();
    let mid = nonzero.len() / 2;
    #[allow(clippy::cast_precision_loss)]
    let median = match nonzero.len() {
        0 => f64::NAN,
        n if n % 2 == 1 => nonzero[mid] as f64,
        _ => (nonzero[mid - 1] + nonzero[mid]) as f64 / 2.0,
    };

    MatrixStats {
        n_docs: matrix.rows.len(),
        n_terms: matrix.terms.len(),
        sparsity,
        avg_nonzero_terms_per_doc: avg,
        median_nonzero_terms_per_doc: median,
    }
}

/// Vocabulary overlap between two matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VocabComparison {
    vocab_a: usize,
    vocab_b: usize,
    intersection: usize,
    union: usize,
    /// `intersection / union`, or `0.0` when both are empty.
    jaccard: f64,
}

fn compare_vocab(a: &Matrix, b: &Matrix) -> VocabComparison {
    let vocab_a: BTreeSet<&str> = a.terms.iter().map(String::as_str).collect();
    let vocab_b: BTreeSet<&str> = b.terms.iter().map(String::as_str).collect();
    let intersection = vocab_a.intersection(&vocab_b).count();
    let union = vocab_a.union(&vocab_b).count();
    #[allow(clippy::cast_precision_loss)]
    let jaccard = if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    };
    VocabComparison {
        vocab_a: vocab_a.len(),
        vocab_b: vocab_b.len(),
        intersection,
        union,
        jaccard,
    }
}

/// Mean TF-IDF of one shared term in two matrices.
#[derive(Debug, Clone, PartialEq)]
struct TermGap {
    term: String,
    mean_a: f64,
    mean_b: f64,
    abs_diff: f64,
}

/// Shared terms with the largest absolute mean gap, ties by term.
fn term_gaps(a: &Matrix, b: &Matrix, k: usize) -> Vec<TermGap> {
    let means_b = b.term_means();
    let mut gaps: Vec<TermGap> = a
        .term_means()
        .into_iter()
        .filter_map(|(term, mean_a)| {
            let mean_b = *means_b.get(term)?;
            Some(TermGap {
                term: term.to_string(),
                mean_a,
                mean_b,
                abs_diff: (mean_a - mean_b).abs(),
            })
        })
        .collect();
    gaps.sort_by(|x, y| {
        y.abs_diff
            .total_cmp(&x.abs_diff)
            .then_with(|| x.term.cmp(&y.term))
    });
    gaps.truncate(k);
    gaps
}

/// Highest values first; ties by term.
fn top_k(terms: &[String], values: &[f64], k: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(&String, f64)> = terms.iter().zip(values.iter().copied()).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(k)
        .map(|(t, v)| (t.clone(), v))
        .collect()
}

struct Loaded {
    name: String,
    matrix: Matrix,
    stats: MatrixStats,
}

/// Summarizes every embedding matrix in `paths` together.
///
/// Writes `<name>_top_mean_tfidf` and `<name>_top_doc_freq` charts per input,
/// a `<a>_vs_<b>_mean_tfidf_gap.csv` per pair, and [`REPORT_FILE_NAME`].
/// Inputs that cannot be read are logged and left out.
///
/// # Errors
///
/// Returns [`ProcessingError::Io`] if the output directory cannot be created
/// or the report cannot be written.
pub fn summarize_embeddings<P: AsRef<Path>>(
    paths: &[P],
    options: &EdaOptions,
) -> Result<EdaReport, ProcessingError> {
    create_dir(&options.output_dir)?;
    let mut report = EdaReport::default();
    let mut loaded: Vec<Loaded> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let (matrix, coerced) = match load_matrix(path) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!(input = %path.display(), error = %e, "failed to load embeddings");
                report.skipped.push(format!("{}: {e}", path.display()));
                continue;
            }
        };
        if coerced > 0 {
            tracing::warn!(input = %path.display(), cells = coerced, "non-numeric cells read as 0");
        }
        let name = unique_name(safe_name(path), &loaded);
        let stats = basic_stats(&matrix);
        write_top_terms(&name, &matrix, options, &mut report);
        loaded.push(Loaded {
            name,
            matrix,
            stats,
        });
    }

    if loaded.is_empty() {
        tracing::warn!("no embedding matrix loaded; report not written");
        return Ok(report);
    }

    let mut pairs = Vec::new();
    for (i, a) in loaded.iter().enumerate() {
        for b in &loaded[i + 1..] {
            let gaps = term_gaps(&a.matrix, &b.matrix, GAP_TERMS);
            if !gaps.is_empty() {
                write_gap_csv(options, a, b, &gaps, &mut report);
            }
            pairs.push((a, b, compare_vocab(&a.matrix, &b.matrix), gaps));
        }
    }

    let report_path = options.output_dir.join(REPORT_FILE_NAME);
    let text = render_report(&loaded, &pairs);
    std::fs::write(&report_path, text).map_err(|source| ProcessingError::Io {
        path: report_path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %report_path.display(), inputs = loaded.len(), "wrote embedding report");
    report.written.push(report_path);
    Ok(report)
}

/// Appends `_2`, `_3`, … to a name already taken by an earlier input.
fn unique_name(base: String, loaded: &[Loaded]) -> String {
    let taken = |candidate: &str| loaded.iter().any(|l| l.name == candidate);
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn write_top_terms(name: &str, matrix: &Matrix, options: &EdaOptions, report: &mut EdaReport) {
    if matrix.rows.is_empty() || matrix.terms.is_empty() {
        tracing::warn!(input = name, "empty embedding matrix; top-term charts skipped");
        report.skipped.push(format!("{name}: empty matrix"));
        return;
    }
    let charts = [
        ("top_mean_tfidf", "mean_tfidf", matrix.column_means()),
        ("top_doc_freq", "doc_freq", matrix.doc_freq_ratio()),
    ];
    for (suffix, value_header, values) in charts {
        let series = Series {
            label_header: "term",
            value_header,
            decimals: 6,
            points: top_k(&matrix.terms, &values, options.top_k),
        };
        emit(
            &options.output_dir,
            &format!("{name}_{suffix}"),
            &series,
            Orientation::Horizontal,
            report,
        );
    }
}

fn write_gap_csv(
    options: &EdaOptions,
    a: &Loaded,
    b: &Loaded,
    gaps: &[TermGap],
    report: &mut EdaReport,
) {
    let path = options
        .output_dir
        .join(format!("{}_vs_{}_mean_tfidf_gap.csv", a.name, b.name));
    let rows = gaps.iter().map(|g| {
        [
            g.term.clone(),
            format!("{:.6}", g.mean_a),
            format!("{:.6}", g.mean_b),
            format!("{:.6}", g.abs_diff),
        ]
    });
    match write_csv(&path, ["term", "mean_tfidf_A", "mean_tfidf_B", "abs_diff"], rows) {
        Ok(()) => report.written.push(path),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to write term gaps");
            report.skipped.push(format!("{}: {e}", path.display()));
        }
    }
}

type Pair<'a> = (&'a Loaded, &'a Loaded, VocabComparison, Vec<TermGap>);

fn render_report(loaded: &[Loaded], pairs: &[Pair<'_>]) -> String {
    let mut out = String::from("=== TF-IDF Embedding EDA Report ===\n\n");
    for entry in loaded {
        let s = &entry.stats;
        let _ = writeln!(out, "[{}]", entry.name);
        let _ = writeln!(out, "  - n_docs: {}", s.n_docs);
        let _ = writeln!(out, "  - n_terms: {}", s.n_terms);
        let _ = writeln!(out, "  - sparsity(zeros_ratio): {}", float(s.sparsity));
        let _ = writeln!(out, "  - avg_nonzero_terms_per_doc: {}", float(s.avg_nonzero_terms_per_doc));
        let _ = writeln!(
            out,
            "  - median_nonzero_terms_per_doc: {}",
            float(s.median_nonzero_terms_per_doc)
        );
        out.push('\n');
    }

    if pairs.is_empty() {
        return out;
    }
    out.push_str("=== Pairwise Vocabulary Comparison ===\n\n");
    for (a, b, vocab, gaps) in pairs {
        let _ = writeln!(out, "[{}] vs [{}]", a.name, b.name);
        let _ = writeln!(out, "  - vocab_a: {}", vocab.vocab_a);
        let _ = writeln!(out, "  - vocab_b: {}", vocab.vocab_b);
        let _ = writeln!(out, "  - intersection: {}", vocab.intersection);
        let _ = writeln!(out, "  - union: {}", vocab.union);
        let _ = writeln!(out, "  - jaccard: {}", float(vocab.jaccard));
        if gaps.is_empty() {
            out.push_str("  - common terms: 0 (no overlap)\n\n");
        } else {
            let _ = writeln!(
                out,
                "  - top {GAP_TERMS} common terms with largest mean tf-idf gap:"
            );
            out.push_str(&gap_table(gaps));
            out.push_str("\n\n");
        }
    }
    out
}

/// Right-aligned columns, terms left-aligned; no trailing newline.
fn gap_table(gaps: &[TermGap]) -> String {
    let term_width = gaps
        .iter()
        .map(|g| g.term.chars().count())
        .max()
        .unwrap_or(0)
        .max("term".len());
    let mut lines = vec![format!(
        "{:<term_width$}  {:>12}  {:>12}  {:>12}",
        "term", "mean_tfidf_A", "mean_tfidf_B", "abs_diff"
    )];
    lines.extend(gaps.iter().map(|g| {
        format!(
            "{:<term_width$}  {:>12.6}  {:>12.6}  {:>12.6}",
            g.term, g.mean_a, g.mean_b, g.abs_diff
        )
    }));
    lines.join("\n")
}

/// Report float: whole numbers keep one decimal, NaN prints as `nan`.
fn float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
#[path = "embedding_eda_test.rs"]
mod tests;
