//! Duplicate detection across crawl polls and table rows.
//!
//! Infinite-scroll pages re-render cards already seen, so a review is
//! identified by its date plus a bounded prefix of its content.

use std::collections::HashSet;

use revscope_core::{NormalizedRecord, RawRecord};

/// `"<date>|<first N chars of content>"`.
pub type DedupKey = String;

/// Anything that can produce a dedup key given a prefix length.
pub trait HasDedupKey {
    fn dedup_key(&self, prefix_chars: usize) -> DedupKey;
}

impl HasDedupKey for RawRecord {
    fn dedup_key(&self, prefix_chars: usize) -> DedupKey {
        make_key(
            self.date.as_deref().unwrap_or("").trim(),
            self.content.as_deref().unwrap_or("").trim(),
            prefix_chars,
        )
    }
}

impl HasDedupKey for NormalizedRecord {
    fn dedup_key(&self, prefix_chars: usize) -> DedupKey {
        make_key(&self.date_iso(), &self.content, prefix_chars)
    }
}

fn make_key(date: &str, content: &str, prefix_chars: usize) -> DedupKey {
    let prefix: String = content.chars().take(prefix_chars).collect();
    format!("{date}|{prefix}")
}

/// Remembers every key it has seen for the lifetime of one crawl or batch.
#[derive(Debug)]
pub struct Deduplicator {
    prefix_chars: usize,
    seen: HashSet<DedupKey>,
}

impl Deduplicator {
    #[must_use]
    pub fn new(prefix_chars: usize) -> Self {
        Self {
            prefix_chars,
            seen: HashSet::new(),
        }
    }

    /// Returns `true` if an item with the same key was already seen.
    /// The first occurrence is recorded and reported as not duplicate.
    pub fn is_duplicate(&mut self, item: &impl HasDedupKey) -> bool {
        !self.seen.insert(item.dedup_key(self.prefix_chars))
    }

    /// Number of distinct keys recorded so far.
    #[must_use]
    pub fn seen(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn first_occurrence_is_kept() {
        let mut dedup = Deduplicator::new(80);
        let record = RawRecord::new(Some("5"), Some("2024-01-01"), Some("nice place"));
        assert!(!dedup.is_duplicate(&record));
        assert!(dedup.is_duplicate(&record));
        assert_eq!(dedup.seen(), 1);
    }

    #[test]
    fn rating_does_not_affect_key() {
        let mut dedup = Deduplicator::new(80);
        let a = RawRecord::new(Some("5"), Some("2024-01-01"), Some("nice place"));
        let b = RawRecord::new(Some("3"), Some("2024-01-01"), Some("nice place"));
        assert!(!dedup.is_duplicate(&a));
        assert!(dedup.is_duplicate(&b));
    }

    #[test]
    fn shared_prefix_collides() {
        let long_a = format!("{} tail A", "x".repeat(80));
        let long_b = format!("{} tail B", "x".repeat(80));
        let mut dedup = Deduplicator::new(80);
        assert!(!dedup.is_duplicate(&RawRecord::new(None, Some("2024-01-01"), Some(&long_a))));
        assert!(dedup.is_duplicate(&RawRecord::new(None, Some("2024-01-01"), Some(&long_b))));
    }

    #[test]
    fn different_dates_are_distinct() {
        let mut dedup = Deduplicator::new(80);
        assert!(!dedup.is_duplicate(&RawRecord::new(None, Some("2024-01-01"), Some("same"))));
        assert!(!dedup.is_duplicate(&RawRecord::new(None, Some("2024-01-02"), Some("same"))));
        assert_eq!(dedup.seen(), 2);
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        let record = RawRecord::new(None, Some("2024.01.01."), Some("맛있어요 정말"));
        assert_eq!(record.dedup_key(3), "2024.01.01.|맛있어");
    }

    #[test]
    fn normalized_key_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let record = NormalizedRecord::from_validated(5.0, date, "Great".to_string());
        assert_eq!(record.dedup_key(80), "2024-01-01|Great");
    }
}
