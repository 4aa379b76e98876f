use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

/// One measured value of a lab test or vital sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub value: f64,
    pub effective: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicalStatus {
    #[default]
    Active,
    Inactive,
    Resolved,
}

/// A problem-list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub code: String,
    #[serde(default)]
    pub status: ClinicalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<DateTime<Utc>>,
    #[serde(default)]
    pub chronic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationStatus {
    #[default]
    Active,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub code: String,
    #[serde(default)]
    pub status: MedicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped: Option<DateTime<Utc>>,
}

/// A mock patient record used for dry runs, matching the expected JSON format.
///
/// Observations are keyed by field id, with multi-part measurements keyed as
/// `field.component` (e.g. `blood-pressure.systolic`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    pub patient_id: String,
    /// The evaluation instant; timeframes look back from here.
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub observations: HashMap<String, Vec<Observation>>,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
    #[serde(default)]
    pub medications: Vec<MedicationRecord>,
}

impl PatientContext {
    /// Load a patient record from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let data = serde_json::from_str(&content)?;
        Ok(data)
    }

    pub fn new(patient_id: impl Into<String>, as_of: DateTime<Utc>) -> Self {
        Self {
            patient_id: patient_id.into(),
            as_of,
            birth_date: None,
            gender: None,
            observations: HashMap::new(),
            conditions: Vec::new(),
            medications: Vec::new(),
        }
    }

    /// Whole years of age at `as_of`.
    pub fn age_years(&self) -> Option<u32> {
        self.as_of.date_naive().years_since(self.birth_date?)
    }

    /// Readings for `key` up to `as_of`, oldest first, restricted to `window` when given.
    pub fn readings(&self, key: &str, window: Option<TimeDelta>) -> Vec<Observation> {
        let mut readings: Vec<Observation> = self
            .observations
            .get(key)
            .map(|all| {
                all.iter()
                    .copied()
                    .filter(|o| o.effective <= self.as_of)
                    .filter(|o| window.is_none_or(|w| o.effective >= self.as_of - w))
                    .collect()
            })
            .unwrap_or_default();
        readings.sort_by_key(|o| o.effective);
        readings
    }

    pub fn conditions_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ConditionRecord> {
        self.conditions
            .iter()
            .filter(move |c| c.code.eq_ignore_ascii_case(code))
    }

    pub fn medications_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a MedicationRecord> {
        self.medications
            .iter()
            .filter(move |m| m.code.eq_ignore_ascii_case(code))
    }

    pub fn with_observation(mut self, key: impl Into<String>, value: f64, days_ago: i64) -> Self {
        let effective = self.as_of - TimeDelta::days(days_ago);
        self.observations
            .entry(key.into())
            .or_default()
            .push(Observation { value, effective });
        self
    }

    pub fn with_condition(mut self, code: impl Into<String>, status: ClinicalStatus, chronic: bool) -> Self {
        self.conditions.push(ConditionRecord {
            code: code.into(),
            status,
            onset: None,
            chronic,
        });
        self
    }

    pub fn with_medication(mut self, code: impl Into<String>, status: MedicationStatus) -> Self {
        self.medications.push(MedicationRecord {
            code: code.into(),
            status,
            started: None,
            stopped: None,
        });
        self
    }
}

impl Default for PatientContext {
    /// A 58-year-old woman with poorly controlled type 2 diabetes and hypertension.
    fn default() -> Self {
        let as_of = DateTime::from_timestamp(1_717_243_200, 0).unwrap_or_default();
        let mut patient = Self::new("mock-patient-1", as_of)
            .with_observation("HbA1c", 7.4, 170)
            .with_observation("HbA1c", 7.9, 80)
            .with_observation("HbA1c", 8.2, 20)
            .with_observation("glucose", 182.0, 20)
            .with_observation("creatinine", 1.1, 20)
            .with_observation("blood-pressure.systolic", 146.0, 6)
            .with_observation("blood-pressure.systolic", 152.0, 3)
            .with_observation("blood-pressure.systolic", 158.0, 1)
            .with_observation("blood-pressure.diastolic", 92.0, 6)
            .with_observation("blood-pressure.diastolic", 95.0, 3)
            .with_observation("blood-pressure.diastolic", 94.0, 1)
            .with_observation("heart-rate", 78.0, 1)
            .with_observation("temperature", 36.9, 1)
            .with_condition("hypertension", ClinicalStatus::Active, true)
            .with_medication("metformin", MedicationStatus::Active)
            .with_medication("lisinopril", MedicationStatus::Active);
        patient.birth_date = NaiveDate::from_ymd_opt(1966, 3, 14);
        patient.gender = Some("female".to_string());
        patient.conditions.push(ConditionRecord {
            code: "diabetes".to_string(),
            status: ClinicalStatus::Active,
            onset: Some(as_of - TimeDelta::days(4 * 365)),
            chronic: true,
        });
        patient
    }
}
