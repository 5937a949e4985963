use chrono::{TimeZone, Utc};
use ncrp_intake_lib::{
    core::types::{ComplaintRecord, ComplaintsResponse},
    insights::{
        analytics::analytics_summary,
        listing::list_complaints,
        stats::{crime_awareness, dashboard_stats, is_high_priority},
        CountEntry,
    },
    providers::backend::Endpoints,
};
use serde_json::json;

fn records() -> Vec<ComplaintRecord> {
    let response: ComplaintsResponse = serde_json::from_value(json!({
        "rows": [
            {
                "id": 1,
                "complaintDate": "2024-05-02",
                "processedDateTime": "2024-05-10 09:30:00",
                "cybercrimeType": "UPI Fraud",
                "platformInvolved": "PhonePe",
                "districtState": "Ernakulam",
                "totalAmountLoss": "₹ 75,000",
                "savedFilename": "NCRP 1.pdf"
            },
            {
                "id": "2",
                "complaintDate": "2024-04-20",
                "cybercrimeType": "Extortion",
                "districtState": "Thrissur",
                "currentStatus": "Closed",
                "totalAmountLoss": 500
            },
            {
                "id": "3",
                "complaintDate": "2024-05-09T22:00:00Z",
                "cybercrimeType": "UPI Fraud",
                "districtState": "Ernakulam",
                "totalAmountLoss": "12000"
            },
            {
                "id": "4",
                "complaintDate": null,
                "totalAmountLoss": null
            }
        ]
    }))
    .expect("complaints");
    response.rows
}

fn entry(label: &str, count: usize) -> CountEntry {
    CountEntry {
        label: label.to_string(),
        count,
    }
}

#[test]
fn lenient_fields_accept_numbers() {
    let rows = records();
    assert_eq!(rows[0].id.as_deref(), Some("1"));
    assert_eq!(rows[1].total_amount_loss.as_deref(), Some("500"));
    assert_eq!(rows[3].complaint_date, None);
}

#[test]
fn dashboard_counts() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).single().expect("now");
    let stats = dashboard_stats(&records(), now);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.high_priority, 2);
    assert_eq!(stats.last_24h, 2);
    assert_eq!(stats.most_common_type, "UPI Fraud");
}

#[test]
fn rupee_abbreviation_does_not_shrink_amount() {
    let rows: ComplaintsResponse = serde_json::from_value(json!({
        "rows": [{"id": "9", "cybercrimeType": "Job Scam", "totalAmountLoss": "Rs. 75,000"}]
    }))
    .expect("complaints");
    let stats = dashboard_stats(&rows.rows, Utc::now());
    assert_eq!(stats.high_priority, 1);
    assert!(is_high_priority(&rows.rows[0]));
}

#[test]
fn empty_dashboard() {
    let stats = dashboard_stats(&[], Utc::now());
    assert_eq!(stats.total, 0);
    assert_eq!(stats.most_common_type, "Unknown");
}

#[test]
fn awareness_sorted_by_count() {
    assert_eq!(
        crime_awareness(&records()),
        vec![entry("UPI Fraud", 2), entry("Extortion", 1), entry("Unknown", 1)]
    );
}

#[test]
fn analytics_series() {
    let summary = analytics_summary(&records());
    assert_eq!(
        summary.crime_types,
        vec![entry("UPI Fraud", 2), entry("Extortion", 1), entry("Others", 1)]
    );
    assert_eq!(summary.platforms, vec![entry("PhonePe", 1), entry("Unknown", 3)]);
    assert_eq!(summary.statuses, vec![entry("Open", 3), entry("Closed", 1)]);
    assert_eq!(summary.districts[0], entry("Ernakulam", 2));
    assert_eq!(summary.monthly_trend, vec![entry("2024-04", 1), entry("2024-05", 2)]);
    assert_eq!(
        summary.amount_buckets,
        vec![entry("<1k", 2), entry("1k-10k", 0), entry("10k-50k", 1), entry(">50k", 1)]
    );
}

#[test]
fn listing_filters_and_links() {
    let endpoints = Endpoints {
        api_base: "http://localhost:5000".to_string(),
        uploads_route: "/uploads".to_string(),
    };
    let all = list_complaints(records(), None, &endpoints);
    assert_eq!(all.len(), 4);
    assert_eq!(
        all[0].file_link.as_deref(),
        Some("http://localhost:5000/uploads/NCRP%201.pdf")
    );
    assert_eq!(all[1].file_link, None);

    let fraud = list_complaints(records(), Some("upi fraud"), &endpoints);
    assert_eq!(fraud.len(), 2);
    assert!(fraud.iter().all(|listing| listing.record.cybercrime_type.as_deref() == Some("UPI Fraud")));
}
