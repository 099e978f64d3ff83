//! Rating and date parsing for scraped review fields.
//!
//! Review cards render ratings as bare numbers (`"4"`), aria labels
//! (`"Rated 4.0 out of 5"`) or localized text (`"별점 5"`), and dates either
//! as absolute dates in several layouts or as relative phrases
//! (`"3 weeks ago"`, `"2일 전"`). Relative phrases resolve against a caller
//! supplied `today` so parsing stays deterministic.

use std::sync::LazyLock;

use chrono::{Days, Months, NaiveDate, NaiveDateTime};
use regex::Regex;

/// First number in a label. The number must not continue a digit run or
/// follow a bare dot, so `".5"` never reads as `5`.
static LABEL_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(-?\d+(?:\.\d+)?)").expect("valid regex")
});

static EN_RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(a|an|one|\d+)\s+(minute|hour|day|week|month|year)s?\s+ago$")
        .expect("valid regex")
});

static KO_RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*(분|시간|일|주|개월|달|년)\s*전$").expect("valid regex")
});

/// Absolute date layouts, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y.%m.%d.",
    "%Y.%m.%d",
    "%Y/%m/%d",
    "%Y년 %m월 %d일",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Suffixes review cards append to the date of an edited review.
const EDIT_MARKERS: &[&str] = &["(edited)", "edited", "(수정됨)", "수정됨", "수정"];

/// Reads a rating token as a number.
///
/// A token that is a number on its own (`"4.5"`, `".5"`, `"1e1"`) is taken
/// at face value; otherwise the first number in the label is used
/// (`"Rated 4.0 out of 5"`). Returns `None` when there is no number or the
/// value is not finite. Range checking is left to the caller.
#[must_use]
pub fn parse_rating(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    let value = match trimmed.parse::<f64>() {
        Ok(v) => v,
        Err(_) => LABEL_NUMBER_RE
            .captures(trimmed)
            .and_then(|caps| caps[1].parse::<f64>().ok())?,
    };
    Some(value).filter(|v| v.is_finite())
}

/// Parses an absolute or relative review date.
///
/// Returns `None` if the text matches no supported layout or the relative
/// offset falls outside the calendar range.
#[must_use]
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let cleaned = strip_edit_marker(text);
    if cleaned.is_empty() {
        return None;
    }
    parse_absolute(&cleaned).or_else(|| parse_relative(&cleaned, today))
}

fn strip_edit_marker(text: &str) -> String {
    let mut s = text.trim().to_lowercase();
    loop {
        let before = s.len();
        for marker in EDIT_MARKERS {
            if let Some(rest) = s.strip_suffix(marker) {
                s = rest.trim_end().trim_end_matches(['·', ',', '-']).trim_end().to_string();
            }
        }
        if s.len() == before {
            return s;
        }
    }
}

fn parse_absolute(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    match text {
        "today" | "just now" | "오늘" | "방금" | "방금 전" => return Some(today),
        "yesterday" | "어제" => return today.checked_sub_days(Days::new(1)),
        _ => {}
    }

    if let Some(caps) = EN_RELATIVE_RE.captures(text) {
        let amount = match &caps[1] {
            "a" | "an" | "one" => 1,
            digits => digits.parse::<u32>().ok()?,
        };
        return offset(today, amount, &caps[2]);
    }

    if let Some(caps) = KO_RELATIVE_RE.captures(text) {
        let amount = caps[1].parse::<u32>().ok()?;
        let unit = match &caps[2] {
            "분" => "minute",
            "시간" => "hour",
            "일" => "day",
            "주" => "week",
            "개월" | "달" => "month",
            _ => "year",
        };
        return offset(today, amount, unit);
    }

    None
}

fn offset(today: NaiveDate, amount: u32, unit: &str) -> Option<NaiveDate> {
    match unit {
        // Sub-day offsets stay on the current date.
        "minute" | "hour" => Some(today),
        "day" => today.checked_sub_days(Days::new(u64::from(amount))),
        "week" => today.checked_sub_days(Days::new(u64::from(amount) * 7)),
        "month" => today.checked_sub_months(Months::new(amount)),
        "year" => today.checked_sub_months(Months::new(amount.checked_mul(12)?)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
