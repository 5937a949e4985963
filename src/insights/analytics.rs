use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::ComplaintRecord;

use super::{by_count_desc, label_or, parse_amount, parse_datetime, tally, CountEntry};

const CRIME_TYPE_LIMIT: usize = 10;
const DISTRICT_LIMIT: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AmountBucket {
    #[serde(rename = "<1k")]
    UnderOneThousand,
    #[serde(rename = "1k-10k")]
    UpToTenThousand,
    #[serde(rename = "10k-50k")]
    UpToFiftyThousand,
    #[serde(rename = ">50k")]
    OverFiftyThousand,
}

impl AmountBucket {
    pub const ALL: [AmountBucket; 4] = [
        AmountBucket::UnderOneThousand,
        AmountBucket::UpToTenThousand,
        AmountBucket::UpToFiftyThousand,
        AmountBucket::OverFiftyThousand,
    ];

    pub fn for_amount(amount: f64) -> Self {
        if amount <= 1_000.0 {
            AmountBucket::UnderOneThousand
        } else if amount <= 10_000.0 {
            AmountBucket::UpToTenThousand
        } else if amount <= 50_000.0 {
            AmountBucket::UpToFiftyThousand
        } else {
            AmountBucket::OverFiftyThousand
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AmountBucket::UnderOneThousand => "<1k",
            AmountBucket::UpToTenThousand => "1k-10k",
            AmountBucket::UpToFiftyThousand => "10k-50k",
            AmountBucket::OverFiftyThousand => ">50k",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub crime_types: Vec<CountEntry>,
    pub platforms: Vec<CountEntry>,
    pub statuses: Vec<CountEntry>,
    pub districts: Vec<CountEntry>,
    /// `YYYY-MM` ascending.
    pub monthly_trend: Vec<CountEntry>,
    /// Always all four buckets, smallest first.
    pub amount_buckets: Vec<CountEntry>,
}

pub fn analytics_summary(records: &[ComplaintRecord]) -> AnalyticsSummary {
    let mut crime_types = tally(
        records
            .iter()
            .map(|record| label_or(record.cybercrime_type.as_deref(), "Others")),
    );
    crime_types.truncate(CRIME_TYPE_LIMIT);

    let platforms = tally(
        records
            .iter()
            .map(|record| label_or(record.platform_involved.as_deref(), "Unknown")),
    );
    let statuses = tally(
        records
            .iter()
            .map(|record| label_or(record.current_status.as_deref(), "Open")),
    );

    let mut districts = by_count_desc(tally(
        records
            .iter()
            .map(|record| label_or(record.district_state.as_deref(), "Unknown")),
    ));
    districts.truncate(DISTRICT_LIMIT);

    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.complaint_date.as_deref().and_then(parse_datetime) {
            *months.entry(date.format("%Y-%m").to_string()).or_default() += 1;
        }
    }
    let monthly_trend = months
        .into_iter()
        .map(|(label, count)| CountEntry { label, count })
        .collect();

    let mut bucket_counts = [0usize; 4];
    for record in records {
        let amount = parse_amount(record.total_amount_loss.as_deref()).unwrap_or(0.0);
        let bucket = AmountBucket::for_amount(amount);
        if let Some(slot) = AmountBucket::ALL.iter().position(|candidate| *candidate == bucket) {
            bucket_counts[slot] += 1;
        }
    }
    let amount_buckets = AmountBucket::ALL
        .iter()
        .zip(bucket_counts)
        .map(|(bucket, count)| CountEntry {
            label: bucket.label().to_string(),
            count,
        })
        .collect();

    AnalyticsSummary {
        crime_types,
        platforms,
        statuses,
        districts,
        monthly_trend,
        amount_buckets,
    }
}
