mod support;

use ncrp_intake_lib::core::{
    fields::{resolve_field, row_label, LogicalField},
    types::ExtractedRow,
};
use serde_json::json;
use support::row;

#[test]
fn resolves_through_aliases() {
    let extracted = row(&[("complaint_id", "X1"), ("mobile", "555")]);
    assert_eq!(resolve_field(&extracted, LogicalField::ComplaintId), "X1");
    assert_eq!(resolve_field(&extracted, LogicalField::Mobile), "555");
    assert_eq!(resolve_field(&extracted, LogicalField::Email), "");
}

#[test]
fn canonical_key_wins_over_aliases() {
    let extracted = row(&[("Email", "canonical@x.com"), ("email", "alias@x.com")]);
    assert_eq!(resolve_field(&extracted, LogicalField::Email), "canonical@x.com");
}

#[test]
fn empty_values_fall_through_to_next_alias() {
    let extracted = row(&[("complaint_id", ""), ("id", "NCRP-9")]);
    assert_eq!(resolve_field(&extracted, LogicalField::ComplaintId), "NCRP-9");
}

#[test]
fn alias_order_decides_between_candidates() {
    let extracted = row(&[("status", "Closed"), ("currentStatus", "Open")]);
    assert_eq!(resolve_field(&extracted, LogicalField::CurrentStatus), "Open");
}

#[test]
fn numbers_and_nulls_from_loose_json() {
    let extracted: ExtractedRow = serde_json::from_value(json!({
        "totalAmount": 25000,
        "district": null,
        "state": "Kerala"
    }))
    .expect("row");
    assert_eq!(resolve_field(&extracted, LogicalField::TotalAmountLost), "25000");
    assert_eq!(resolve_field(&extracted, LogicalField::District), "");
    assert_eq!(resolve_field(&extracted, LogicalField::State), "Kerala");
}

#[test]
fn label_falls_back_to_position() {
    assert_eq!(row_label(&row(&[("id", "C-1")]), 0), "C-1");
    assert_eq!(row_label(&row(&[("mobile", "555")]), 4), "row-4");
}

#[test]
fn extraction_error_rows_are_flagged() {
    let failed = row(&[("Source", "ERROR"), ("file", "scan.pdf"), ("error", "OCR failed")]);
    assert_eq!(failed.extraction_error().as_deref(), Some("scan.pdf: OCR failed"));
    assert_eq!(row(&[("Source", "a.csv")]).extraction_error(), None);
}
