//! Biomarker data model and identity.
//!
//! A [`Biomarker`] is one named lab measurement extracted from a report.
//! Records are immutable once fetched; merging multiple fetches produces
//! duplicates, which [`dedupe`](dedupe::dedupe) collapses using the identity
//! rules defined here.

pub mod dedupe;
pub mod favorites;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single lab measurement as returned by `GET /biomarkers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Biomarker {
    /// Backend id. Records ingested from older endpoints may lack one.
    pub id: Option<Uuid>,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub reference_range_low: Option<f64>,
    pub reference_range_high: Option<f64>,
    pub is_abnormal: bool,
    pub report_date: NaiveDate,
    pub source_file_id: String,
}

/// Identity of a biomarker record: the backend id when present, otherwise
/// the measurement tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BiomarkerKey {
    Id(Uuid),
    Measurement(MeasurementKey),
}

/// Value-tuple identity — two records with the same name, value, unit, and
/// report date are the same measurement regardless of which endpoint they
/// came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeasurementKey {
    pub name: String,
    /// `f64` is not `Eq`; the raw bits are, and identical measurements
    /// serialize to identical bits.
    pub value_bits: u64,
    pub unit: String,
    pub report_date: NaiveDate,
}

impl Biomarker {
    /// Primary identity: id when present, else the measurement tuple.
    pub fn key(&self) -> BiomarkerKey {
        match self.id {
            Some(id) => BiomarkerKey::Id(id),
            None => BiomarkerKey::Measurement(self.measurement_key()),
        }
    }

    /// Tuple identity, always computable.
    pub fn measurement_key(&self) -> MeasurementKey {
        MeasurementKey {
            name: self.name.clone(),
            value_bits: self.value.to_bits(),
            unit: self.unit.clone(),
            report_date: self.report_date,
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Minimal biomarker for tests; callers override what matters.
    pub fn biomarker(name: &str, value: f64, date: &str) -> Biomarker {
        Biomarker {
            id: Some(Uuid::new_v4()),
            name: name.to_string(),
            value,
            unit: "mg/dL".to_string(),
            reference_range_low: None,
            reference_range_high: None,
            is_abnormal: false,
            report_date: date.parse().expect("valid test date"),
            source_file_id: "file-1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::biomarker;
    use super::*;

    #[test]
    fn key_prefers_id() {
        let b = biomarker("Glucose", 95.0, "2024-03-20");
        assert!(matches!(b.key(), BiomarkerKey::Id(_)));
    }

    #[test]
    fn key_falls_back_to_tuple_without_id() {
        let mut b = biomarker("Glucose", 95.0, "2024-03-20");
        b.id = None;
        assert!(matches!(b.key(), BiomarkerKey::Measurement(_)));
    }

    #[test]
    fn measurement_key_matches_across_different_ids() {
        let a = biomarker("Glucose", 95.0, "2024-03-20");
        let b = biomarker("Glucose", 95.0, "2024-03-20");
        assert_ne!(a.id, b.id);
        assert_eq!(a.measurement_key(), b.measurement_key());
    }

    #[test]
    fn measurement_key_distinguishes_values() {
        let a = biomarker("Glucose", 95.0, "2024-03-20");
        let b = biomarker("Glucose", 96.0, "2024-03-20");
        assert_ne!(a.measurement_key(), b.measurement_key());
    }

    #[test]
    fn deserializes_snake_case_wire_record() {
        let json = r#"{
            "id": "7f1d9abc-3a52-4a8e-9d3f-2f6f3f1b0c11",
            "name": "Glucose",
            "value": 95.0,
            "unit": "mg/dL",
            "reference_range_low": 70.0,
            "reference_range_high": 100.0,
            "is_abnormal": false,
            "report_date": "2024-03-20",
            "source_file_id": "file-abc"
        }"#;
        let b: Biomarker = serde_json::from_str(json).unwrap();
        assert_eq!(b.name, "Glucose");
        assert_eq!(b.report_date, "2024-03-20".parse().unwrap());
        assert_eq!(b.reference_range_high, Some(100.0));
    }

    #[test]
    fn deserializes_record_without_id() {
        let json = r#"{
            "id": null,
            "name": "TSH",
            "value": 2.1,
            "unit": "mIU/L",
            "reference_range_low": null,
            "reference_range_high": null,
            "is_abnormal": false,
            "report_date": "2024-01-15",
            "source_file_id": "file-abc"
        }"#;
        let b: Biomarker = serde_json::from_str(json).unwrap();
        assert!(b.id.is_none());
    }
}
