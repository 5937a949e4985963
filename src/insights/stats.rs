use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::ComplaintRecord;

use super::{by_count_desc, label_or, parse_amount, parse_datetime, tally, CountEntry};

const HIGH_PRIORITY_AMOUNT: f64 = 50_000.0;
const HIGH_PRIORITY_KEYWORDS: [&str; 5] = ["kidnap", "kidnapping", "threat", "extortion", "emergency"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub high_priority: usize,
    pub last_24h: usize,
    pub most_common_type: String,
}

pub fn is_high_priority(record: &ComplaintRecord) -> bool {
    if parse_amount(record.total_amount_loss.as_deref()).is_some_and(|amount| amount > HIGH_PRIORITY_AMOUNT) {
        return true;
    }
    let crime_type = record
        .cybercrime_type
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    HIGH_PRIORITY_KEYWORDS
        .iter()
        .any(|keyword| crime_type.contains(keyword))
}

/// First parseable of processed, complaint and incident time.
pub fn record_time(record: &ComplaintRecord) -> Option<DateTime<Utc>> {
    [
        &record.processed_date_time,
        &record.complaint_date,
        &record.incident_date_time,
    ]
    .into_iter()
    .flatten()
    .find_map(|raw| parse_datetime(raw))
}

pub fn dashboard_stats(records: &[ComplaintRecord], now: DateTime<Utc>) -> DashboardStats {
    let window_start = now - Duration::hours(24);
    let last_24h = records
        .iter()
        .filter_map(record_time)
        .filter(|time| *time >= window_start && *time <= now)
        .count();

    let most_common_type = by_count_desc(crime_type_tally(records))
        .into_iter()
        .next()
        .map(|entry| entry.label)
        .unwrap_or_else(|| "Unknown".to_string());

    DashboardStats {
        total: records.len(),
        high_priority: records.iter().filter(|record| is_high_priority(record)).count(),
        last_24h,
        most_common_type,
    }
}

/// Complaint count per crime type, most frequent first.
pub fn crime_awareness(records: &[ComplaintRecord]) -> Vec<CountEntry> {
    by_count_desc(crime_type_tally(records))
}

fn crime_type_tally(records: &[ComplaintRecord]) -> Vec<CountEntry> {
    tally(
        records
            .iter()
            .map(|record| label_or(record.cybercrime_type.as_deref(), "Unknown")),
    )
}
