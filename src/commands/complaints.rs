use chrono::Utc;
use serde::Serialize;

use crate::{
    core::errors::AppResult,
    insights::{
        analytics::{analytics_summary, AnalyticsSummary},
        listing::{list_complaints as build_listing, ComplaintListing},
        stats::{crime_awareness, dashboard_stats, DashboardStats},
        CountEntry,
    },
    providers::backend::IntakeBackend,
    AppState,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub stats: DashboardStats,
    pub crime_awareness: Vec<CountEntry>,
}

pub async fn list_complaints(state: &AppState, category: Option<&str>) -> AppResult<Vec<ComplaintListing>> {
    let records = state.backend.list_complaints().await?;
    Ok(build_listing(records, category, &state.endpoints))
}

pub async fn get_stats(state: &AppState) -> AppResult<StatsResponse> {
    let records = state.backend.list_complaints().await?;
    Ok(StatsResponse {
        stats: dashboard_stats(&records, Utc::now()),
        crime_awareness: crime_awareness(&records),
    })
}

pub async fn get_analytics(state: &AppState) -> AppResult<AnalyticsSummary> {
    let records = state.backend.list_complaints().await?;
    Ok(analytics_summary(&records))
}
