//! Alert cards shown when a hook fires, and the operations over a hook's card list.

use crate::error::CardError;
use crate::model::{CardId, SuggestionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    #[default]
    Info,
    Warning,
    Critical,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionBehavior {
    #[default]
    Any,
    AtMostOne,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSource {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Absolute,
    Smart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub label: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub link_type: LinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    pub code: String,
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverrideReasons {
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Coding>>,
}

/// A proposed action attached to a card, e.g. "order HbA1c".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: SuggestionId,
    pub label: String,
    #[serde(default)]
    pub target_resource_type: String,
    /// Opaque FHIR resource payload.
    #[serde(default)]
    pub resource_template: serde_json::Value,
    #[serde(default)]
    pub is_recommended: bool,
}

impl Suggestion {
    pub fn new(
        label: impl Into<String>,
        target_resource_type: impl Into<String>,
        resource_template: serde_json::Value,
    ) -> Self {
        Self {
            id: SuggestionId::generate(),
            label: label.into(),
            target_resource_type: target_resource_type.into(),
            resource_template,
            is_recommended: false,
        }
    }

    pub fn recommended(mut self) -> Self {
        self.is_recommended = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub summary: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub indicator: Indicator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<CardSource>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub selection_behavior: SelectionBehavior,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_reasons: Option<OverrideReasons>,
}

impl Card {
    pub fn new(summary: impl Into<String>, indicator: Indicator) -> Self {
        Self {
            id: CardId::generate(),
            summary: summary.into(),
            detail: String::new(),
            indicator,
            source: None,
            suggestions: Vec::new(),
            links: Vec::new(),
            selection_behavior: SelectionBehavior::Any,
            override_reasons: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_source(mut self, label: impl Into<String>, url: Option<String>) -> Self {
        self.source = Some(CardSource {
            label: label.into(),
            url,
            icon: None,
        });
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.links.push(Link {
            label: label.into(),
            url: url.into(),
            link_type: LinkType::Absolute,
            app_context: None,
        });
        self
    }
}

/// A card as held by the editor, with presentation state that never reaches the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDraft {
    #[serde(flatten)]
    pub card: Card,
    #[serde(default)]
    pub expanded: bool,
}

impl From<Card> for CardDraft {
    fn from(card: Card) -> Self {
        Self {
            card,
            expanded: false,
        }
    }
}

/// A partial card update. `None` leaves the property untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CardPatch {
    pub summary: Option<String>,
    pub detail: Option<String>,
    pub indicator: Option<Indicator>,
    pub source: Option<Option<CardSource>>,
    pub suggestions: Option<Vec<Suggestion>>,
    pub links: Option<Vec<Link>>,
    pub selection_behavior: Option<SelectionBehavior>,
    pub override_reasons: Option<Option<OverrideReasons>>,
    pub expanded: Option<bool>,
}

/// Appends a blank, expanded info card.
pub fn add_card(cards: &[CardDraft]) -> (Vec<CardDraft>, CardId) {
    let draft = CardDraft {
        card: Card::new("", Indicator::Info),
        expanded: true,
    };
    let id = draft.card.id.clone();
    let mut next = cards.to_vec();
    next.push(draft);
    (next, id)
}

/// Appends an existing card, rejecting an id already in the list.
pub fn insert_card(cards: &[CardDraft], card: Card) -> Result<Vec<CardDraft>, CardError> {
    if cards.iter().any(|c| c.card.id == card.id) {
        return Err(CardError::DuplicateId(card.id));
    }
    let mut next = cards.to_vec();
    next.push(card.into());
    Ok(next)
}

fn position(cards: &[CardDraft], id: &CardId) -> Result<usize, CardError> {
    cards
        .iter()
        .position(|c| &c.card.id == id)
        .ok_or_else(|| CardError::NotFound(id.clone()))
}

pub fn update_card(cards: &[CardDraft], id: &CardId, patch: &CardPatch) -> Result<Vec<CardDraft>, CardError> {
    let index = position(cards, id)?;
    let mut next = cards.to_vec();
    let draft = &mut next[index];
    let card = &mut draft.card;
    if let Some(summary) = &patch.summary {
        card.summary = summary.clone();
    }
    if let Some(detail) = &patch.detail {
        card.detail = detail.clone();
    }
    if let Some(indicator) = patch.indicator {
        card.indicator = indicator;
    }
    if let Some(source) = &patch.source {
        card.source = source.clone();
    }
    if let Some(suggestions) = &patch.suggestions {
        card.suggestions = suggestions.clone();
    }
    if let Some(links) = &patch.links {
        card.links = links.clone();
    }
    if let Some(behavior) = patch.selection_behavior {
        card.selection_behavior = behavior;
    }
    if let Some(reasons) = &patch.override_reasons {
        card.override_reasons = reasons.clone();
    }
    if let Some(expanded) = patch.expanded {
        draft.expanded = expanded;
    }
    Ok(next)
}

pub fn remove_card(cards: &[CardDraft], id: &CardId) -> Result<Vec<CardDraft>, CardError> {
    let index = position(cards, id)?;
    let mut next = cards.to_vec();
    next.remove(index);
    Ok(next)
}

/// Copies a card right after the original. The copy and each of its suggestions get
/// fresh ids.
pub fn duplicate_card(cards: &[CardDraft], id: &CardId) -> Result<(Vec<CardDraft>, CardId), CardError> {
    let index = position(cards, id)?;
    let mut copy = cards[index].clone();
    copy.card.id = CardId::generate();
    for suggestion in &mut copy.card.suggestions {
        suggestion.id = SuggestionId::generate();
    }
    let copy_id = copy.card.id.clone();
    let mut next = cards.to_vec();
    next.insert(index + 1, copy);
    Ok((next, copy_id))
}

/// Strips editor-only state. Suggestion and link order is preserved.
pub fn compile_card(draft: &CardDraft) -> Card {
    draft.card.clone()
}
