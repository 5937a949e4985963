//! Read-only summaries over committed complaints.

pub mod analytics;
pub mod listing;
pub mod stats;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
}

/// Counts labels, keeping first-seen order.
pub(crate) fn tally<I, S>(labels: I) -> Vec<CountEntry>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut entries: Vec<CountEntry> = Vec::new();
    for label in labels {
        let label = label.into();
        match entries.iter_mut().find(|entry| entry.label == label) {
            Some(entry) => entry.count += 1,
            None => entries.push(CountEntry { label, count: 1 }),
        }
    }
    entries
}

/// Stable sort, highest count first.
pub(crate) fn by_count_desc(mut entries: Vec<CountEntry>) -> Vec<CountEntry> {
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

pub(crate) fn label_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Amount lost as a number, ignoring currency symbols and separators.
/// A `.` only counts once a digit has been seen, so "Rs. 75,000" is 75000.
pub fn parse_amount(raw: Option<&str>) -> Option<f64> {
    let mut digits = String::new();
    for ch in raw?.chars() {
        if ch.is_ascii_digit() || (ch == '.' && !digits.is_empty()) {
            digits.push(ch);
        }
    }
    digits
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc())
}
