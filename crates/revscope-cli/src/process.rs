//! `process` command: runs the tabular pipeline for one site.

use std::path::Path;

use revscope_core::{load_site_profiles, PipelineConfig, ReviewSite, SiteProfile};
use revscope_processing::{RunSummary, SiteProcessor};

/// Pick the profile for `site`: the entry from `sites_config` if the file has
/// one, otherwise the built-in profile.
///
/// # Errors
///
/// Returns an error if the sites file cannot be read or fails validation.
pub(crate) fn resolve_profile(
    site: ReviewSite,
    sites_config: Option<&Path>,
) -> anyhow::Result<SiteProfile> {
    let Some(path) = sites_config else {
        return Ok(site.default_profile());
    };
    let profiles = load_site_profiles(path)?;
    let profile = profiles.into_iter().find(|p| p.site == site).unwrap_or_else(|| {
        tracing::warn!(site = %site, path = %path.display(), "site missing from sites file; using built-in profile");
        site.default_profile()
    });
    Ok(profile)
}

/// # Errors
///
/// Returns an error if nothing could be written for a non-empty input.
pub(crate) fn run_process(
    profile: SiteProfile,
    pipeline: PipelineConfig,
    input: &Path,
) -> anyhow::Result<()> {
    let processor = SiteProcessor::new(profile, pipeline);
    let summary = processor.run(input);
    print_summary(&summary);

    if summary.rows > 0 && summary.persist.table_path.is_none() {
        anyhow::bail!(
            "{} rows processed for {} but the table could not be written",
            summary.rows,
            summary.site
        );
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let report = &summary.clean;
    println!(
        "process {}: {} of {} rows kept from {} (dropped {}, duplicates {})",
        summary.site,
        report.kept,
        report.input_rows,
        summary.input.display(),
        report.dropped(),
        report.duplicates,
    );
    if !report.missing_columns.is_empty() {
        println!("  missing columns: {}", report.missing_columns.join(", "));
    }
    match &summary.persist.table_path {
        Some(path) => println!("  table: {}", path.display()),
        None => println!("  table: not written"),
    }
    if let (Some(path), Some(terms)) = (&summary.persist.embeddings_path, summary.embedding_terms) {
        println!("  embeddings: {} ({terms} terms)", path.display());
    }
}
