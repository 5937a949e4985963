//! Logical complaint fields and the source keys each one is read from.
//!
//! Extracted rows come from CSV headers, spreadsheet cells and OCR output, so
//! the same field shows up under different names. Each logical field lists the
//! keys it accepts in priority order; the canonical name is always tried first.

use serde::{Deserialize, Serialize};

use crate::core::types::ExtractedRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LogicalField {
    Source,
    ComplaintId,
    ComplaintDate,
    IncidentDateTime,
    Mobile,
    Email,
    FullAddress,
    District,
    State,
    CybercrimeType,
    Platform,
    TotalAmountLost,
    CurrentStatus,
}

struct FieldSpec {
    field: LogicalField,
    name: &'static str,
    aliases: &'static [&'static str],
}

const FIELD_TABLE: &[FieldSpec] = &[
    FieldSpec {
        field: LogicalField::Source,
        name: "Source",
        aliases: &["source", "file"],
    },
    FieldSpec {
        field: LogicalField::ComplaintId,
        name: "Complaint ID",
        aliases: &["complaint_id", "id", "ComplaintId", "complaintId"],
    },
    FieldSpec {
        field: LogicalField::ComplaintDate,
        name: "Complaint Date",
        aliases: &["complaint_date", "complaintDate"],
    },
    FieldSpec {
        field: LogicalField::IncidentDateTime,
        name: "Incident Date & Time",
        aliases: &["incident_datetime", "incidentDateTime", "Incident Date"],
    },
    FieldSpec {
        field: LogicalField::Mobile,
        name: "Mobile",
        aliases: &["mobile", "mobileNumber", "Mobile Number"],
    },
    FieldSpec {
        field: LogicalField::Email,
        name: "Email",
        aliases: &["email", "emailId", "Email ID"],
    },
    FieldSpec {
        field: LogicalField::FullAddress,
        name: "Full Address",
        aliases: &["full_address", "fullAddress", "Address"],
    },
    FieldSpec {
        field: LogicalField::District,
        name: "District",
        aliases: &["district"],
    },
    FieldSpec {
        field: LogicalField::State,
        name: "State",
        aliases: &["state"],
    },
    FieldSpec {
        field: LogicalField::CybercrimeType,
        name: "Cybercrime Type",
        aliases: &["cybercrime_type", "cybercrimeType", "type"],
    },
    FieldSpec {
        field: LogicalField::Platform,
        name: "Platform",
        aliases: &["platform", "platformInvolved", "Platform Involved"],
    },
    FieldSpec {
        field: LogicalField::TotalAmountLost,
        name: "Total Amount Lost",
        aliases: &["total_amount_lost", "totalAmountLoss", "totalAmount"],
    },
    FieldSpec {
        field: LogicalField::CurrentStatus,
        name: "Current Status",
        aliases: &["current_status", "currentStatus", "status"],
    },
];

impl LogicalField {
    pub const ALL: [LogicalField; 13] = [
        LogicalField::Source,
        LogicalField::ComplaintId,
        LogicalField::ComplaintDate,
        LogicalField::IncidentDateTime,
        LogicalField::Mobile,
        LogicalField::Email,
        LogicalField::FullAddress,
        LogicalField::District,
        LogicalField::State,
        LogicalField::CybercrimeType,
        LogicalField::Platform,
        LogicalField::TotalAmountLost,
        LogicalField::CurrentStatus,
    ];

    fn spec(self) -> &'static FieldSpec {
        FIELD_TABLE
            .iter()
            .find(|spec| spec.field == self)
            .unwrap_or(&FIELD_TABLE[0])
    }

    /// Canonical column name; also the key written back on commit.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn aliases(self) -> &'static [&'static str] {
        self.spec().aliases
    }

    /// Looks a field up by canonical name or any alias, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ALL.into_iter().find(|field| {
            field.name().eq_ignore_ascii_case(wanted)
                || field
                    .aliases()
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(wanted))
        })
    }
}

/// First non-empty value among the canonical key and then each alias in
/// order; empty string when nothing matches.
pub fn resolve_field(row: &ExtractedRow, field: LogicalField) -> String {
    std::iter::once(field.name())
        .chain(field.aliases().iter().copied())
        .find_map(|key| row.text(key))
        .unwrap_or_default()
}

/// Display label for a row: its complaint id, else `row-<position>`.
pub fn row_label(row: &ExtractedRow, position: usize) -> String {
    let id = resolve_field(row, LogicalField::ComplaintId);
    if id.is_empty() {
        format!("row-{position}")
    } else {
        id
    }
}
