//! Collects every problem in a draft at once, for display next to the editor.
//!
//! Compilation stops at the first problem; validation keeps going and separates blocking
//! errors from advisory warnings.

use crate::compiler::check_leaf;
use crate::config::EditorConfig;
use crate::hook::HookDraft;
use crate::model::{CardId, NodeId};
use crate::registry::OperatorRegistry;
use std::fmt;
use tracing::debug;

/// Card summaries longer than this are truncated by most EHR displays.
pub const MAX_SUMMARY_CHARS: usize = 140;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueLocation {
    Hook,
    Node(NodeId),
    Card(CardId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub location: IssueLocation,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.location {
            IssueLocation::Hook => write!(f, "{}: {}", severity, self.message),
            IssueLocation::Node(id) => write!(f, "{} [condition {}]: {}", severity, id, self.message),
            IssueLocation::Card(id) => write!(f, "{} [card {}]: {}", severity, id, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn push(&mut self, severity: Severity, location: IssueLocation, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity,
            location,
            message: message.into(),
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// True when nothing blocks saving; warnings are allowed.
    pub fn can_save(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn validate_draft(
    draft: &HookDraft,
    registry: &OperatorRegistry,
    config: &EditorConfig,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if draft.title.trim().is_empty() {
        report.push(Severity::Error, IssueLocation::Hook, "Hook title is required");
    }

    let leaves = draft.tree.leaves();
    if leaves.is_empty() {
        report.push(
            Severity::Warning,
            IssueLocation::Hook,
            "Hook has no conditions and will fire for every patient",
        );
    }
    for leaf in leaves {
        if let Err(err) = check_leaf(leaf, registry) {
            report.push(Severity::Error, IssueLocation::Node(leaf.id.clone()), err.to_string());
        }
    }
    if !draft.tree.has_unique_ids() {
        report.push(
            Severity::Error,
            IssueLocation::Hook,
            "Condition tree contains duplicate node ids",
        );
    }
    let depth = draft.tree.group_height();
    if depth > config.max_depth {
        report.push(
            Severity::Warning,
            IssueLocation::Hook,
            format!(
                "Conditions are nested {} levels deep; the editor allows {}",
                depth, config.max_depth
            ),
        );
    }

    if draft.cards.is_empty() {
        report.push(
            Severity::Warning,
            IssueLocation::Hook,
            "Hook has no cards and will not show anything when it fires",
        );
    }
    for draft_card in &draft.cards {
        let card = &draft_card.card;
        let location = || IssueLocation::Card(card.id.clone());
        let summary_chars = card.summary.trim().chars().count();
        if summary_chars == 0 {
            report.push(Severity::Error, location(), "Card summary is required");
        } else if summary_chars > MAX_SUMMARY_CHARS {
            report.push(
                Severity::Warning,
                location(),
                format!(
                    "Card summary is {} characters; keep it under {}",
                    summary_chars, MAX_SUMMARY_CHARS
                ),
            );
        }
        for suggestion in &card.suggestions {
            if suggestion.target_resource_type.trim().is_empty() {
                report.push(
                    Severity::Error,
                    location(),
                    format!("Suggestion '{}' has no target resource type", suggestion.label),
                );
            }
        }
    }

    debug!(
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        "Validated hook draft"
    );
    report
}
