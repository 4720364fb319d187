use crate::detail::DetailFields;
use serde::Serialize;
use std::fmt;

/// Column headers of the output boundary, in the order every consumer
/// (CSV writer, JSON response) sees them.
pub const FIELD_NAMES: [&str; 8] = [
    "Position ID",
    "Position Title",
    "Category",
    "City",
    "Country",
    "Duration",
    "Key Programming & Technical Skills",
    "Deadline",
];

/// One normalized job listing. Position IDs look like `J####-####` but are
/// not guaranteed unique across pages; duplicates are the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    #[serde(rename = "Position ID")]
    pub position_id: String,
    #[serde(rename = "Position Title")]
    pub position_title: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "Key Programming & Technical Skills")]
    pub skills: String,
    #[serde(rename = "Deadline")]
    pub deadline: String,

    /// Detail-page link carried only during acquisition.
    #[serde(skip)]
    pub detail_href: Option<String>,
}

impl JobRecord {
    pub fn new() -> JobRecord {
        JobRecord::default()
    }

    /// Field values in [`FIELD_NAMES`] order.
    pub fn field_values(&self) -> [&str; 8] {
        [
            self.position_id.as_str(),
            self.position_title.as_str(),
            self.category.as_str(),
            self.city.as_str(),
            self.country.as_str(),
            self.duration.as_str(),
            self.skills.as_str(),
            self.deadline.as_str(),
        ]
    }

    /// Space-joined field values, the haystack the keyword filter runs over.
    pub fn haystack(&self) -> String {
        self.field_values().join(" ")
    }

    /// Merge detail-page fields into the record (Listed -> Enriched).
    pub fn apply_detail(&mut self, fields: &DetailFields) {
        self.duration = fields.duration.clone();
        self.skills = fields.skills.clone();
        self.deadline = fields.deadline.clone();
    }

    /// Strip the transient detail link before the record leaves acquisition.
    pub fn finalize(&mut self) {
        self.detail_href = None;
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in FIELD_NAMES.iter().zip(self.field_values()) {
            writeln!(f, "{:<36}: {}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_record_has_all_fields_empty() {
        let record = JobRecord::new();
        assert!(record.field_values().iter().all(|v| v.is_empty()));
        assert_eq!(record.detail_href, None);
    }

    #[test]
    fn haystack_joins_fields_in_header_order() {
        let record = JobRecord {
            position_id: "J0001-0002".to_string(),
            position_title: "Developer".to_string(),
            city: "Toronto".to_string(),
            ..JobRecord::default()
        };
        assert_eq!(record.haystack(), "J0001-0002 Developer  Toronto    ");
    }

    #[test]
    fn apply_detail_overwrites_enrichment_fields_only() {
        let mut record = JobRecord {
            position_id: "J0001-0002".to_string(),
            duration: "stale".to_string(),
            ..JobRecord::default()
        };
        let fields = DetailFields {
            duration: "4 months".to_string(),
            skills: "Rust ; SQL".to_string(),
            deadline: "2026-01-30".to_string(),
        };
        record.apply_detail(&fields);
        assert_eq!(record.position_id, "J0001-0002");
        assert_eq!(record.duration, "4 months");
        assert_eq!(record.skills, "Rust ; SQL");
        assert_eq!(record.deadline, "2026-01-30");
    }

    #[test]
    fn finalize_strips_detail_link() {
        let mut record = JobRecord {
            detail_href: Some("https://example.com/job/J0001-0002".to_string()),
            ..JobRecord::default()
        };
        record.finalize();
        assert_eq!(record.detail_href, None);
    }
}
