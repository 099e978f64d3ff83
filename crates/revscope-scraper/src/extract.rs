//! Raw review fields → [`NormalizedRecord`].

use chrono::NaiveDate;
use revscope_core::{NormalizedRecord, PipelineConfig, RawRecord, SiteProfile};
use thiserror::Error;

use crate::normalize::{normalize, NormalizeOptions};
use crate::parse::{parse_date, parse_rating};

/// Cell values that mean "no value" in scraped tables.
const NULL_TOKENS: &[&str] = &["none", "nan", "null", "n/a", "na"];

/// Everything [`extract`] needs besides the record itself.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Anchor for relative dates such as "3 days ago".
    pub today: NaiveDate,
    pub min_content_len: usize,
    pub normalize: NormalizeOptions,
    /// Content prefix length used when deduplicating a batch.
    pub dedup_prefix_chars: usize,
}

impl ExtractContext {
    #[must_use]
    pub fn new(today: NaiveDate, min_content_len: usize, normalize: NormalizeOptions) -> Self {
        Self {
            today,
            min_content_len,
            normalize,
            dedup_prefix_chars: PipelineConfig::default().dedup_prefix_chars,
        }
    }

    #[must_use]
    pub fn with_dedup_prefix_chars(mut self, prefix_chars: usize) -> Self {
        self.dedup_prefix_chars = prefix_chars;
        self
    }

    #[must_use]
    pub fn for_profile(profile: &SiteProfile, config: &PipelineConfig, today: NaiveDate) -> Self {
        Self::new(
            today,
            config.min_content_len,
            NormalizeOptions::new(profile.clean_policy)
                .with_boilerplate(profile.boilerplate.clone()),
        )
        .with_dedup_prefix_chars(config.dedup_prefix_chars)
    }
}

/// Why a raw record was not turned into a [`NormalizedRecord`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unparsable rating '{0}'")]
    BadRating(String),

    #[error("rating {0} outside [1, 5]")]
    RatingOutOfRange(f64),

    #[error("unparsable date '{0}'")]
    BadDate(String),

    #[error("content too short after cleaning ({len} < {min})")]
    ContentTooShort { len: usize, min: usize },
}

/// Validates and normalizes one raw record.
///
/// Checks run in a fixed order: field presence, rating, date, content.
/// The first failing check decides the [`Rejection`].
///
/// # Errors
///
/// Returns the [`Rejection`] for the first failing check; no partial record
/// is produced.
pub fn extract(raw: &RawRecord, ctx: &ExtractContext) -> Result<NormalizedRecord, Rejection> {
    let rating_text = present(raw.rating.as_deref()).ok_or(Rejection::MissingField("rating"))?;
    let date_text = present(raw.date.as_deref()).ok_or(Rejection::MissingField("date"))?;
    let content_text =
        present(raw.content.as_deref()).ok_or(Rejection::MissingField("content"))?;

    let rating =
        parse_rating(rating_text).ok_or_else(|| Rejection::BadRating(rating_text.to_owned()))?;
    if !(1.0..=5.0).contains(&rating) {
        return Err(Rejection::RatingOutOfRange(rating));
    }

    let date = parse_date(date_text, ctx.today)
        .ok_or_else(|| Rejection::BadDate(date_text.to_owned()))?;

    let content = normalize(Some(content_text), &ctx.normalize);
    let len = content.chars().count();
    if len < ctx.min_content_len {
        return Err(Rejection::ContentTooShort {
            len,
            min: ctx.min_content_len,
        });
    }

    Ok(NormalizedRecord::from_validated(rating, date, content))
}

/// Returns the trimmed value unless it is absent, blank or a null token.
fn present(value: Option<&str>) -> Option<&str> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || NULL_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
        None
    } else {
        Some(trimmed)
    }
}

/// Per-reason rejection tally, reported by callers for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub missing_field: usize,
    pub bad_rating: usize,
    pub rating_out_of_range: usize,
    pub bad_date: usize,
    pub content_too_short: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::MissingField(_) => self.missing_field += 1,
            Rejection::BadRating(_) => self.bad_rating += 1,
            Rejection::RatingOutOfRange(_) => self.rating_out_of_range += 1,
            Rejection::BadDate(_) => self.bad_date += 1,
            Rejection::ContentTooShort { .. } => self.content_too_short += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.missing_field
            + self.bad_rating
            + self.rating_out_of_range
            + self.bad_date
            + self.content_too_short
    }
}
