//! `crawl` command: replays a captured feed through the scroll loop and saves
//! the accepted reviews as the raw table for `process`.

use std::path::{Path, PathBuf};

use revscope_core::{CrawlConfig, NormalizedRecord, PipelineConfig, ReviewSite};
use revscope_processing::{format_rating, write_csv};
use revscope_scraper::{crawl, CancelFlag, CrawlReport, ExtractContext, ReplaySource};

pub(crate) struct CrawlOptions {
    pub capture: PathBuf,
    pub site: ReviewSite,
    pub page_size: usize,
    pub end_signal: bool,
}

/// Header of the raw table a crawl produces.
pub(crate) const RAW_HEADERS: [&str; 3] = ["rating", "date", "content"];

/// Renders accepted records as `rating,date,content` cells.
pub(crate) fn raw_rows(records: &[NormalizedRecord]) -> Vec<[String; 3]> {
    records
        .iter()
        .map(|r| [format_rating(r.rating), r.date_iso(), r.content.clone()])
        .collect()
}

/// Run one crawl over a capture file and write `reviews_<site>.csv`.
///
/// Ctrl-C cancels the loop between polls; whatever was loaded by then is
/// still extracted and saved.
///
/// # Errors
///
/// Returns an error if the capture cannot be loaded, or if the output file
/// cannot be written.
pub(crate) async fn run_crawl(
    options: &CrawlOptions,
    crawl_config: &CrawlConfig,
    pipeline: &PipelineConfig,
) -> anyhow::Result<()> {
    let mut source = ReplaySource::from_file(&options.capture, options.page_size)?;
    if !options.end_signal {
        source = source.without_end_signal();
    }
    tracing::info!(
        site = %options.site,
        capture = %options.capture.display(),
        records = source.len(),
        target = crawl_config.target_count,
        "starting crawl"
    );

    let profile = options.site.default_profile();
    let ctx = ExtractContext::for_profile(&profile, pipeline, chrono::Local::now().date_naive());

    let cancel = CancelFlag::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("ctrl-c received; stopping after the current poll");
                cancel.cancel();
            }
        })
    };

    let report = crawl(&mut source, crawl_config, &ctx, &cancel).await;
    watcher.abort();

    let path = save_reviews(&pipeline.output_dir, options.site, &report)?;
    print_summary(options.site, &report, &path);
    Ok(())
}

fn save_reviews(dir: &Path, site: ReviewSite, report: &CrawlReport) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(site.raw_file_name());
    write_csv(&path, RAW_HEADERS, raw_rows(&report.records))?;
    tracing::info!(site = %site, path = %path.display(), rows = report.records.len(), "saved reviews");
    Ok(path)
}

fn print_summary(site: ReviewSite, report: &CrawlReport, path: &Path) {
    println!(
        "crawl {site}: {} reviews saved to {} (stopped: {}, polls: {}, loaded: {})",
        report.records.len(),
        path.display(),
        report.outcome.reason,
        report.outcome.polls,
        report.outcome.items,
    );
    println!(
        "  scanned {}, duplicates {}, rejected {}",
        report.scanned,
        report.duplicates,
        report.rejections.total()
    );
}
