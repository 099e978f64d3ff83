//! Review record types shared by the scraper and the processing pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Unvalidated review fields as scraped from a page or read from a table row.
///
/// Any field may be absent or malformed; validation happens in the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "text_or_number")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub content: Option<String>,
}

impl RawRecord {
    #[must_use]
    pub fn new(rating: Option<&str>, date: Option<&str>, content: Option<&str>) -> Self {
        Self {
            rating: rating.map(str::to_owned),
            date: date.map(str::to_owned),
            content: content.map(str::to_owned),
        }
    }
}

/// A validated review with its derived features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Star rating in `[1, 5]`.
    pub rating: f64,
    pub date: NaiveDate,
    /// Cleaned review text.
    pub content: String,
    /// Character count of `content`.
    pub content_length: usize,
    /// `rating >= 4`.
    pub is_positive: bool,
}

impl NormalizedRecord {
    /// Builds a record from validated fields, computing the derived features.
    #[must_use]
    pub fn from_validated(rating: f64, date: NaiveDate, content: String) -> Self {
        let content_length = content.chars().count();
        Self {
            rating,
            date,
            content,
            content_length,
            is_positive: rating >= 4.0,
        }
    }

    /// ISO-8601 (`YYYY-MM-DD`) rendering of the review date.
    #[must_use]
    pub fn date_iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Captured feeds store ratings as numbers (`4.0`) or strings (`"4"`); both
/// land in `RawRecord` as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Int(i64),
        Float(f64),
    }

    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Int(n) => n.to_string(),
        TextOrNumber::Float(f) => f.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_validated_derives_length_and_sentiment() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let record = NormalizedRecord::from_validated(4.5, date, "맛있어요 good".to_string());
        assert_eq!(record.content_length, 9);
        assert!(record.is_positive);
        assert_eq!(record.date_iso(), "2024-01-01");
    }

    #[test]
    fn rating_below_four_is_not_positive() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let record = NormalizedRecord::from_validated(3.9, date, "meh".to_string());
        assert!(!record.is_positive);
    }

    #[test]
    fn raw_record_accepts_numeric_rating() {
        let raw: RawRecord =
            serde_json::from_str(r#"{"rating": 4.0, "date": "2024-01-01", "content": "nice"}"#)
                .expect("deserialize");
        assert_eq!(raw.rating.as_deref(), Some("4"));
        assert_eq!(raw.content.as_deref(), Some("nice"));
    }

    #[test]
    fn raw_record_missing_fields_are_none() {
        let raw: RawRecord = serde_json::from_str(r#"{"rating": "5"}"#).expect("deserialize");
        assert_eq!(raw.rating.as_deref(), Some("5"));
        assert!(raw.date.is_none());
        assert!(raw.content.is_none());
    }
}
