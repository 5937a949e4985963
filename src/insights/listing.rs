use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{core::types::ComplaintRecord, providers::backend::Endpoints};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintListing {
    #[serde(flatten)]
    pub record: ComplaintRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_link: Option<String>,
}

/// `<base><uploads_route>/<saved_filename>` with the filename percent-encoded.
pub fn file_link(endpoints: &Endpoints, saved_filename: &str) -> Option<String> {
    if saved_filename.trim().is_empty() {
        return None;
    }
    let mut url = Url::parse(&endpoints.api_base).ok()?;
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        for part in endpoints.uploads_route.split('/').filter(|part| !part.is_empty()) {
            segments.push(part);
        }
        segments.push(saved_filename);
    }
    Some(url.to_string())
}

/// Filters by crime type (case-insensitive, exact) and attaches file links.
pub fn list_complaints(
    records: Vec<ComplaintRecord>,
    category: Option<&str>,
    endpoints: &Endpoints,
) -> Vec<ComplaintListing> {
    let category = category.map(str::trim).filter(|category| !category.is_empty());
    records
        .into_iter()
        .filter(|record| match category {
            Some(category) => record
                .cybercrime_type
                .as_deref()
                .is_some_and(|crime_type| crime_type.trim().eq_ignore_ascii_case(category)),
            None => true,
        })
        .map(|record| {
            let file_link = record
                .saved_filename
                .as_deref()
                .and_then(|name| file_link(endpoints, name));
            ComplaintListing { record, file_link }
        })
        .collect()
}
