//! Prefetch query templates the execution service resolves before evaluating a hook.

use super::HookTrigger;
use crate::model::ConditionNode;
use crate::registry::Domain;
use std::collections::BTreeMap;

pub const PATIENT_KEY: &str = "patient";

/// The query template a domain needs, keyed by its prefetch name.
pub fn template_for(domain: Domain) -> Option<(&'static str, &'static str)> {
    match domain {
        Domain::Demographic => None,
        Domain::LabValue => Some((
            "labResults",
            "Observation?patient={{context.patientId}}&category=laboratory&_sort=-date",
        )),
        Domain::VitalSign => Some((
            "vitalSigns",
            "Observation?patient={{context.patientId}}&category=vital-signs&_sort=-date",
        )),
        Domain::MedicalCondition => Some((
            "conditions",
            "Condition?patient={{context.patientId}}",
        )),
        Domain::Medication => Some((
            "medications",
            "MedicationRequest?patient={{context.patientId}}",
        )),
    }
}

/// Prefetch entries implied by the tree's leaf domains and the trigger.
pub fn derive(tree: &ConditionNode, trigger: HookTrigger) -> BTreeMap<String, String> {
    let mut prefetch = BTreeMap::new();
    prefetch.insert(
        PATIENT_KEY.to_string(),
        "Patient/{{context.patientId}}".to_string(),
    );
    for (key, query) in tree.domains().into_iter().filter_map(template_for) {
        prefetch.insert(key.to_string(), query.to_string());
    }
    if trigger.has_encounter() {
        prefetch.insert(
            "encounter".to_string(),
            "Encounter/{{context.encounterId}}".to_string(),
        );
    }
    prefetch
}

/// Authored entries override derived ones with the same key.
pub fn merge(
    mut derived: BTreeMap<String, String>,
    authored: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    derived.extend(authored.iter().map(|(k, v)| (k.clone(), v.clone())));
    derived
}
