//! `eda` command: charts for processed tables and embedding matrices.

use std::path::{Path, PathBuf};

use revscope_processing::{
    summarize_embeddings, summarize_table, EdaOptions, EdaReport, TableChart, REPORT_FILE_NAME,
};

pub(crate) fn build_options(
    charts: Option<Vec<TableChart>>,
    output_dir: Option<PathBuf>,
) -> EdaOptions {
    let mut options = EdaOptions::default();
    if let Some(charts) = charts.filter(|c| !c.is_empty()) {
        options.charts = charts;
    }
    if let Some(dir) = output_dir {
        options.output_dir = dir;
    }
    options
}

/// Summarize every existing input. Missing inputs and per-input failures are
/// logged and skipped. Embedding matrices are summarized together so every
/// pair is compared.
///
/// # Errors
///
/// Returns an error when none of `inputs` exists, or when the embedding
/// output directory or report cannot be written.
pub(crate) fn run_eda(
    inputs: &[PathBuf],
    embeddings: bool,
    options: &EdaOptions,
) -> anyhow::Result<()> {
    let existing: Vec<&Path> = inputs
        .iter()
        .map(PathBuf::as_path)
        .filter(|path| {
            let exists = path.exists();
            if !exists {
                tracing::warn!(input = %path.display(), "input not found; skipping");
            }
            exists
        })
        .collect();

    if existing.is_empty() {
        anyhow::bail!("none of the {} input file(s) exists", inputs.len());
    }

    let written = if embeddings {
        let report = summarize_embeddings(&existing, options)?;
        print_report(&format!("{} embedding file(s)", existing.len()), &report);
        if report.written.iter().any(|p| p.ends_with(REPORT_FILE_NAME)) {
            println!("report: {}", options.output_dir.join(REPORT_FILE_NAME).display());
        }
        report.written.len()
    } else {
        let mut written = 0usize;
        for path in existing {
            match summarize_table(path, options) {
                Ok(report) => {
                    written += report.written.len();
                    print_report(&path.display().to_string(), &report);
                }
                Err(e) => {
                    tracing::error!(input = %path.display(), error = %e, "summary failed");
                }
            }
        }
        written
    };

    println!("eda: {written} file(s) under {}", options.output_dir.display());
    Ok(())
}

fn print_report(label: &str, report: &EdaReport) {
    println!(
        "eda {label}: {} file(s) written, {} skipped",
        report.written.len(),
        report.skipped.len()
    );
    for reason in &report.skipped {
        println!("  skipped: {reason}");
    }
}
