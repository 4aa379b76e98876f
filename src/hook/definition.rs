use crate::cards::{Card, CardDraft};
use crate::compiler::CompiledCondition;
use crate::model::ConditionNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// The EHR workflow event that fires a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookTrigger {
    #[default]
    PatientView,
    OrderSelect,
    OrderSign,
    AppointmentBook,
    EncounterStart,
    EncounterDischarge,
    MedicationPrescribe,
}

impl HookTrigger {
    pub const ALL: [HookTrigger; 7] = [
        HookTrigger::PatientView,
        HookTrigger::OrderSelect,
        HookTrigger::OrderSign,
        HookTrigger::AppointmentBook,
        HookTrigger::EncounterStart,
        HookTrigger::EncounterDischarge,
        HookTrigger::MedicationPrescribe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookTrigger::PatientView => "patient-view",
            HookTrigger::OrderSelect => "order-select",
            HookTrigger::OrderSign => "order-sign",
            HookTrigger::AppointmentBook => "appointment-book",
            HookTrigger::EncounterStart => "encounter-start",
            HookTrigger::EncounterDischarge => "encounter-discharge",
            HookTrigger::MedicationPrescribe => "medication-prescribe",
        }
    }

    pub fn has_encounter(&self) -> bool {
        matches!(
            self,
            HookTrigger::EncounterStart | HookTrigger::EncounterDischarge
        )
    }
}

impl fmt::Display for HookTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookMeta {
    pub version: u32,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// The canonical, backend-executable hook. Produced fresh by every compile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub hook: HookTrigger,
    #[serde(default)]
    pub prefetch: BTreeMap<String, String>,
    #[serde(default)]
    pub conditions: Vec<CompiledCondition>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(rename = "_meta")]
    pub meta: HookMeta,
}

impl HookDefinition {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A hook being authored: the editable tree plus everything the canonical form carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub trigger: HookTrigger,
    #[serde(default)]
    pub tree: ConditionNode,
    #[serde(default)]
    pub cards: Vec<CardDraft>,
    /// Authored prefetch entries; they override the derived ones with the same key.
    #[serde(default)]
    pub prefetch: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Metadata of the hook this draft was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<HookMeta>,
}

impl Default for HookDraft {
    fn default() -> Self {
        Self::new("", HookTrigger::PatientView)
    }
}

impl HookDraft {
    pub fn new(title: impl Into<String>, trigger: HookTrigger) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            trigger,
            tree: ConditionNode::empty_root(),
            cards: Vec::new(),
            prefetch: BTreeMap::new(),
            author: None,
            origin: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tree(mut self, tree: ConditionNode) -> Self {
        self.tree = tree;
        self
    }

    pub fn with_card(mut self, card: Card) -> Self {
        self.cards.push(card.into());
        self
    }

    /// The explicit id, else a slug of the title, else a generated one.
    pub fn hook_id(&self) -> String {
        if let Some(id) = self.id.as_deref().filter(|id| !id.trim().is_empty()) {
            return id.trim().to_string();
        }
        let slug = slugify(&self.title);
        if slug.is_empty() {
            format!("hook-{}", Uuid::new_v4().simple())
        } else {
            slug
        }
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_id_from_title() {
        let draft = HookDraft::new("  Diabetes: HbA1c > 7 %  ", HookTrigger::PatientView);
        assert_eq!(draft.hook_id(), "diabetes-hba1c-7");
    }

    #[test]
    fn explicit_id_wins() {
        let mut draft = HookDraft::new("Anything", HookTrigger::OrderSign);
        draft.id = Some("my-hook".into());
        assert_eq!(draft.hook_id(), "my-hook");
    }

    #[test]
    fn trigger_wire_names() {
        let json = serde_json::to_string(&HookTrigger::MedicationPrescribe).unwrap();
        assert_eq!(json, "\"medication-prescribe\"");
    }
}
