use std::time::Duration;

use chrono::NaiveDate;
use revscope_core::{CleanPolicy, CrawlConfig, RawRecord};
use revscope_scraper::{
    converge, crawl, CancelFlag, ExtractContext, NormalizeOptions, PageSource, ReplaySource,
    ScraperError, StopReason,
};

fn fast_config() -> CrawlConfig {
    CrawlConfig {
        target_count: 100,
        max_no_growth: 3,
        poll_timeout: Duration::from_millis(30),
        poll_interval: Duration::from_millis(5),
        max_polls: 50,
        max_duration: Duration::from_secs(10),
    }
}

/// Scripted source: each advance adds `step` items (or fails on scripted
/// calls) and the end signal fires once `end_at` items are rendered.
struct ScriptedSource {
    count: usize,
    step: usize,
    end_at: Option<usize>,
    fail_on_odd_advance: bool,
    advances: u32,
    cancel_after: Option<(u32, CancelFlag)>,
}

impl ScriptedSource {
    fn new(initial: usize, step: usize) -> Self {
        Self {
            count: initial,
            step,
            end_at: None,
            fail_on_odd_advance: false,
            advances: 0,
            cancel_after: None,
        }
    }
}

impl PageSource for ScriptedSource {
    async fn item_count(&self) -> Result<usize, ScraperError> {
        Ok(self.count)
    }

    async fn advance(&mut self) -> Result<(), ScraperError> {
        self.advances += 1;
        if let Some((after, flag)) = &self.cancel_after {
            if self.advances >= *after {
                flag.cancel();
            }
        }
        if self.fail_on_odd_advance && self.advances % 2 == 1 {
            return Err(ScraperError::Source("element went stale".to_string()));
        }
        self.count += self.step;
        Ok(())
    }

    async fn is_at_end(&self) -> Result<bool, ScraperError> {
        Ok(self.end_at.is_some_and(|end| self.count >= end))
    }

    async fn snapshot(&self) -> Result<Vec<RawRecord>, ScraperError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn never_growing_source_stalls_within_bound() {
    let config = fast_config();
    let mut source = ScriptedSource::new(5, 0);

    let outcome = converge(&mut source, &config, &CancelFlag::new()).await;

    assert_eq!(outcome.reason, StopReason::Stalled);
    assert!(outcome.polls <= config.max_no_growth + 1);
    assert_eq!(outcome.items, 5);
}

#[tokio::test]
async fn last_page_on_first_poll_stops_after_that_poll() {
    let mut source = ScriptedSource::new(3, 2);
    source.end_at = Some(5);

    let outcome = converge(&mut source, &fast_config(), &CancelFlag::new()).await;

    assert_eq!(outcome.reason, StopReason::LastPage);
    assert_eq!(outcome.polls, 1);
    assert_eq!(outcome.items, 5);
}

#[tokio::test]
async fn source_already_at_end_is_not_polled() {
    let mut source = ScriptedSource::new(4, 1);
    source.end_at = Some(4);

    let outcome = converge(&mut source, &fast_config(), &CancelFlag::new()).await;

    assert_eq!(outcome.reason, StopReason::LastPage);
    assert_eq!(outcome.polls, 0);
    assert_eq!(source.advances, 0);
}

#[tokio::test]
async fn target_reached_stops_loop() {
    let config = CrawlConfig {
        target_count: 10,
        ..fast_config()
    };
    let mut source = ScriptedSource::new(0, 4);

    let outcome = converge(&mut source, &config, &CancelFlag::new()).await;

    assert_eq!(outcome.reason, StopReason::TargetReached);
    assert_eq!(outcome.polls, 3);
    assert_eq!(outcome.items, 12);
}

#[tokio::test]
async fn poll_errors_count_as_no_growth_without_aborting() {
    let mut source = ScriptedSource::new(0, 2);
    source.fail_on_odd_advance = true;
    source.end_at = Some(10);

    let outcome = converge(&mut source, &fast_config(), &CancelFlag::new()).await;

    assert_eq!(outcome.reason, StopReason::LastPage);
    assert_eq!(outcome.items, 10);
    assert_eq!(outcome.polls, 10);
}

#[tokio::test]
async fn cancellation_is_observed_between_polls() {
    let cancel = CancelFlag::new();
    let mut source = ScriptedSource::new(0, 1);
    source.cancel_after = Some((2, cancel.clone()));

    let outcome = converge(&mut source, &fast_config(), &cancel).await;

    assert_eq!(outcome.reason, StopReason::Cancelled);
    assert_eq!(outcome.polls, 2);
}

#[tokio::test]
async fn pre_cancelled_flag_skips_polling() {
    let cancel = CancelFlag::new();
    cancel.cancel();
    let mut source = ScriptedSource::new(0, 1);

    let outcome = converge(&mut source, &fast_config(), &cancel).await;

    assert_eq!(outcome.reason, StopReason::Cancelled);
    assert_eq!(outcome.polls, 0);
}

#[tokio::test]
async fn poll_budget_bounds_the_loop() {
    let config = CrawlConfig {
        max_no_growth: 20,
        max_polls: 2,
        ..fast_config()
    };
    let mut source = ScriptedSource::new(0, 0);

    let outcome = converge(&mut source, &config, &CancelFlag::new()).await;

    assert_eq!(outcome.reason, StopReason::BudgetExhausted);
    assert_eq!(outcome.polls, 2);
}

fn ctx() -> ExtractContext {
    ExtractContext::new(
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        2,
        NormalizeOptions::new(CleanPolicy::PreserveAll),
    )
}

#[tokio::test]
async fn crawl_dedups_extracts_and_counts_rejections() {
    let feed = vec![
        RawRecord::new(Some("5"), Some("2024.01.01."), Some("맛있어요... 더보기")),
        RawRecord::new(Some("5"), Some("2024.01.01."), Some("맛있어요... 더보기")),
        RawRecord::new(Some("9"), Some("2024.01.02."), Some("out of range")),
        RawRecord::new(Some("3"), Some("어제"), Some("그냥 그래요")),
        RawRecord::new(Some("4"), Some("2024.01.03."), None),
    ];
    let mut source = ReplaySource::from_records(feed, 2).unwrap();

    let report = crawl(&mut source, &fast_config(), &ctx(), &CancelFlag::new()).await;

    assert_eq!(report.outcome.reason, StopReason::LastPage);
    assert_eq!(report.scanned, 5);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.rejections.rating_out_of_range, 1);
    assert_eq!(report.rejections.missing_field, 1);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].content, "맛있어요");
    assert_eq!(report.records[1].date_iso(), "2024-05-31");
}

#[tokio::test]
async fn crawl_truncates_to_target() {
    let feed: Vec<RawRecord> = (0..10)
        .map(|i| RawRecord::new(Some("4"), Some("2024-01-01"), Some(&format!("review {i}"))))
        .collect();
    let mut source = ReplaySource::from_records(feed, 3).unwrap();
    let config = CrawlConfig {
        target_count: 4,
        ..fast_config()
    };

    let report = crawl(&mut source, &config, &ctx(), &CancelFlag::new()).await;

    assert_eq!(report.outcome.reason, StopReason::TargetReached);
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.records[3].content, "review 3");
}

#[tokio::test]
async fn replay_without_end_signal_stalls_after_exhaustion() {
    let feed: Vec<RawRecord> = (0..3)
        .map(|i| RawRecord::new(Some("4"), Some("2024-01-01"), Some(&format!("review {i}"))))
        .collect();
    let mut source = ReplaySource::from_records(feed, 2)
        .unwrap()
        .without_end_signal();
    let config = fast_config();

    let outcome = converge(&mut source, &config, &CancelFlag::new()).await;

    assert_eq!(outcome.reason, StopReason::Stalled);
    assert_eq!(outcome.items, 3);
    assert!(outcome.polls <= 1 + config.max_no_growth + 1);
}
