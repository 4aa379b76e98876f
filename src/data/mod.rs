//! Mock patient records for dry-running hooks.

mod model;

pub use model::{
    ClinicalStatus, ConditionRecord, MedicationRecord, MedicationStatus, Observation,
    PatientContext,
};
