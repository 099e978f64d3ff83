//! The page-session capability the convergence loop drives.

use std::future::Future;
use std::path::Path;

use revscope_core::RawRecord;

use crate::error::ScraperError;

/// A paged, lazily growing list of review cards.
///
/// A live browser session and a replayed capture both implement this; the
/// convergence loop only ever sees the trait.
pub trait PageSource {
    /// Number of review items currently rendered.
    fn item_count(&self) -> impl Future<Output = Result<usize, ScraperError>> + Send;

    /// Triggers loading of more items (scroll, "more" button, next page).
    fn advance(&mut self) -> impl Future<Output = Result<(), ScraperError>> + Send;

    /// Whether the source has signalled that no more items will load.
    fn is_at_end(&self) -> impl Future<Output = Result<bool, ScraperError>> + Send;

    /// Raw fields of every item currently rendered, in page order.
    fn snapshot(&self) -> impl Future<Output = Result<Vec<RawRecord>, ScraperError>> + Send;
}

/// Replays a captured review feed, revealing `page_size` records per advance.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    records: Vec<RawRecord>,
    page_size: usize,
    revealed: usize,
    signals_end: bool,
}

impl ReplaySource {
    /// Builds a source over in-memory records. The first page is visible
    /// before any advance, as on a freshly loaded review page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidPageSize`] if `page_size` is zero.
    pub fn from_records(records: Vec<RawRecord>, page_size: usize) -> Result<Self, ScraperError> {
        if page_size == 0 {
            return Err(ScraperError::InvalidPageSize(page_size));
        }
        let revealed = page_size.min(records.len());
        Ok(Self {
            records,
            page_size,
            revealed,
            signals_end: true,
        })
    }

    /// Loads a capture file: a JSON array of objects with optional
    /// `rating`, `date` and `content` fields.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::CaptureIo`] or [`ScraperError::CaptureParse`]
    /// if the file cannot be read or decoded, and
    /// [`ScraperError::InvalidPageSize`] if `page_size` is zero.
    pub fn from_file(path: &Path, page_size: usize) -> Result<Self, ScraperError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScraperError::CaptureIo {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<RawRecord> =
            serde_json::from_str(content.trim_start_matches('\u{feff}')).map_err(|source| {
                ScraperError::CaptureParse {
                    path: path.display().to_string(),
                    source,
                }
            })?;
        Self::from_records(records, page_size)
    }

    /// Some pages never show an end marker; with this set the source keeps
    /// reporting "not at end" once exhausted and only stops growing.
    #[must_use]
    pub fn without_end_signal(mut self) -> Self {
        self.signals_end = false;
        self
    }

    /// Total number of records in the capture.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PageSource for ReplaySource {
    async fn item_count(&self) -> Result<usize, ScraperError> {
        Ok(self.revealed)
    }

    async fn advance(&mut self) -> Result<(), ScraperError> {
        self.revealed = self
            .revealed
            .saturating_add(self.page_size)
            .min(self.records.len());
        Ok(())
    }

    async fn is_at_end(&self) -> Result<bool, ScraperError> {
        Ok(self.signals_end && self.revealed >= self.records.len())
    }

    async fn snapshot(&self) -> Result<Vec<RawRecord>, ScraperError> {
        Ok(self.records[..self.revealed].to_vec())
    }
}
