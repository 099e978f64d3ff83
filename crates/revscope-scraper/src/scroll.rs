//! Scroll convergence loop and the batch extraction that follows it.
//!
//! The loop drives a [`PageSource`] until one of the stop conditions holds:
//! cancellation, the target item count, the source's last-page signal, the
//! poll or wall-clock budget, or `max_no_growth` consecutive polls without
//! new items. Every wait is bounded, so the loop always terminates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use revscope_core::{CrawlConfig, NormalizedRecord};

use crate::dedup::Deduplicator;
use crate::error::ScraperError;
use crate::extract::{extract, ExtractContext, RejectionCounts};
use crate::source::PageSource;

/// Cooperative abort flag, checked between polls.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    LastPage,
    /// `max_no_growth` consecutive polls added nothing.
    Stalled,
    BudgetExhausted,
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::TargetReached => "target reached",
            StopReason::LastPage => "last page",
            StopReason::Stalled => "stalled",
            StopReason::BudgetExhausted => "budget exhausted",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceOutcome {
    /// Item count when the loop stopped.
    pub items: usize,
    pub polls: u32,
    pub reason: StopReason,
}

enum PollResult {
    Grew(usize),
    LastPage,
    Flat,
}

/// Drives `source` until it converges.
///
/// Poll failures are logged and count as a poll without growth; they never
/// abort the loop.
pub async fn converge<S: PageSource>(
    source: &mut S,
    config: &CrawlConfig,
    cancel: &CancelFlag,
) -> ConvergenceOutcome {
    let started = Instant::now();
    let mut items = match source.item_count().await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, "initial item count failed; assuming 0");
            0
        }
    };
    let mut polls: u32 = 0;
    let mut no_growth: u32 = 0;

    let outcome = |items, polls, reason| ConvergenceOutcome {
        items,
        polls,
        reason,
    };

    loop {
        if cancel.is_cancelled() {
            return outcome(items, polls, StopReason::Cancelled);
        }
        if items >= config.target_count {
            return outcome(items, polls, StopReason::TargetReached);
        }
        match source.is_at_end().await {
            Ok(true) => return outcome(items, polls, StopReason::LastPage),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "last-page check failed"),
        }
        if polls >= config.max_polls || started.elapsed() >= config.max_duration {
            return outcome(items, polls, StopReason::BudgetExhausted);
        }

        polls += 1;
        match poll_once(source, config, items).await {
            Ok(PollResult::Grew(n)) => {
                tracing::debug!(poll = polls, before = items, after = n, "feed grew");
                items = n;
                no_growth = 0;
            }
            Ok(PollResult::LastPage) => {
                if let Ok(n) = source.item_count().await {
                    items = n;
                }
                tracing::debug!(poll = polls, items, "source reported last page");
                return outcome(items, polls, StopReason::LastPage);
            }
            Ok(PollResult::Flat) => {
                no_growth += 1;
            }
            Err(e) => {
                tracing::warn!(poll = polls, error = %e, "poll failed");
                no_growth += 1;
            }
        }

        if no_growth >= config.max_no_growth {
            tracing::info!(
                polls,
                items,
                max_no_growth = config.max_no_growth,
                "feed stopped growing"
            );
            return outcome(items, polls, StopReason::Stalled);
        }
    }
}

async fn poll_once<S: PageSource>(
    source: &mut S,
    config: &CrawlConfig,
    before: usize,
) -> Result<PollResult, ScraperError> {
    source.advance().await?;
    if source.is_at_end().await? {
        return Ok(PollResult::LastPage);
    }

    match tokio::time::timeout(
        config.poll_timeout,
        wait_for_growth(source, before, config.poll_interval),
    )
    .await
    {
        Ok(result) => result.map(PollResult::Grew),
        Err(_) => {
            let waited = ScraperError::Timeout {
                what: "item growth",
                waited_ms: u64::try_from(config.poll_timeout.as_millis()).unwrap_or(u64::MAX),
            };
            tracing::debug!(error = %waited, "no growth this poll");
            Ok(PollResult::Flat)
        }
    }
}

async fn wait_for_growth<S: PageSource>(
    source: &S,
    before: usize,
    interval: Duration,
) -> Result<usize, ScraperError> {
    loop {
        let count = source.item_count().await?;
        if count > before {
            return Ok(count);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Result of one crawl: convergence plus the extracted batch.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: ConvergenceOutcome,
    /// Accepted records in page order, at most `target_count`.
    pub records: Vec<NormalizedRecord>,
    /// Raw records in the final snapshot.
    pub scanned: usize,
    pub duplicates: usize,
    pub rejections: RejectionCounts,
}

/// Runs the convergence loop, then extracts one snapshot of the feed.
///
/// A failed snapshot yields a report with no records.
pub async fn crawl<S: PageSource>(
    source: &mut S,
    config: &CrawlConfig,
    ctx: &ExtractContext,
    cancel: &CancelFlag,
) -> CrawlReport {
    let outcome = converge(source, config, cancel).await;
    tracing::info!(
        items = outcome.items,
        polls = outcome.polls,
        reason = %outcome.reason,
        "convergence finished"
    );

    let mut report = CrawlReport {
        outcome,
        records: Vec::new(),
        scanned: 0,
        duplicates: 0,
        rejections: RejectionCounts::default(),
    };

    let raw = match source.snapshot().await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(error = %e, "snapshot failed; no records extracted");
            return report;
        }
    };
    report.scanned = raw.len();

    let mut dedup = Deduplicator::new(ctx.dedup_prefix_chars);
    for record in &raw {
        if report.records.len() >= config.target_count {
            break;
        }
        if dedup.is_duplicate(record) {
            report.duplicates += 1;
            continue;
        }
        match extract(record, ctx) {
            Ok(normalized) => report.records.push(normalized),
            Err(rejection) => {
                tracing::debug!(reason = %rejection, "record rejected");
                report.rejections.record(&rejection);
            }
        }
    }

    tracing::info!(
        scanned = report.scanned,
        accepted = report.records.len(),
        duplicates = report.duplicates,
        rejected = report.rejections.total(),
        "crawl batch extracted"
    );
    report
}
