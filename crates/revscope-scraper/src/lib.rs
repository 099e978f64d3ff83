//! Scrape-and-normalize core for map and travel-site reviews.
//!
//! A [`PageSource`] abstracts the rendered review feed. The convergence loop
//! in [`scroll`] keeps asking it for more content until the feed stops
//! growing; the batch step then runs every raw record through the
//! [`Deduplicator`] and the review [`extract`]or, which uses the text
//! [`normalize`]r for content.

pub mod dedup;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod parse;
pub mod scroll;
pub mod source;

pub use dedup::{DedupKey, Deduplicator, HasDedupKey};
pub use error::ScraperError;
pub use extract::{extract, ExtractContext, Rejection, RejectionCounts};
pub use normalize::{normalize, NormalizeOptions};
pub use scroll::{converge, crawl, CancelFlag, ConvergenceOutcome, CrawlReport, StopReason};
pub use source::{PageSource, ReplaySource};
