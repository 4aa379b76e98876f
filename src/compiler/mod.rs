//! Turns the editable tree into the canonical hook grammar and back.

use crate::cards::{CardDraft, compile_card};
use crate::error::CompileError;
use crate::hook::{HookDefinition, HookDraft, HookMeta, prefetch};
use crate::model::{ConditionNode, LogicalOperator, NodeId};
use crate::registry::{LabDefinition, OperatorRegistry, VitalDefinition};
use ahash::AHashSet;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

mod checks;
mod grammar;
mod normalize;

pub use grammar::{CompiledCondition, CompiledGroup};

pub(crate) use checks::check_leaf;

/// Compiles a tree into its canonical condition list (an implicit AND).
///
/// Fails on the first leaf that does not pass registry validation.
pub fn compile(
    tree: &ConditionNode,
    registry: &OperatorRegistry,
) -> Result<Vec<CompiledCondition>, CompileError> {
    let mut out = Vec::new();
    normalize::lower_node(tree, LogicalOperator::And, registry, &mut out)?;
    Ok(out)
}

/// Rebuilds an AND-rooted editable tree from a compiled condition list.
pub fn parse(conditions: &[CompiledCondition]) -> ConditionNode {
    let mut seen = AHashSet::new();
    ConditionNode::Group(normalize::raise(conditions, LogicalOperator::And, &mut seen))
}

/// Parses a JSON condition list into an editable tree.
pub fn parse_json(json: &str) -> Result<ConditionNode, CompileError> {
    let conditions: Vec<CompiledCondition> =
        serde_json::from_str(json).map_err(|e| CompileError::JsonParseError(e.to_string()))?;
    Ok(parse(&conditions))
}

/// Compiles trees, cards and drafts against one operator registry.
#[derive(Debug, Clone, Default)]
pub struct HookCompiler {
    registry: OperatorRegistry,
    default_author: Option<String>,
}

pub struct CompilerBuilder {
    registry: OperatorRegistry,
    default_author: Option<String>,
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self {
            registry: OperatorRegistry::new(),
            default_author: None,
        }
    }

    /// Replaces the built-in registry entirely.
    pub fn with_registry(mut self, registry: OperatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_lab(mut self, lab: LabDefinition) -> Self {
        self.registry = self.registry.with_lab(lab);
        self
    }

    pub fn with_vital(mut self, vital: VitalDefinition) -> Self {
        self.registry = self.registry.with_vital(vital);
        self
    }

    /// Author stamped into `_meta` when a draft names none.
    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = Some(author.into());
        self
    }

    pub fn build(self) -> HookCompiler {
        HookCompiler {
            registry: self.registry,
            default_author: self.default_author,
        }
    }
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HookCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn compile(&self, tree: &ConditionNode) -> Result<Vec<CompiledCondition>, CompileError> {
        compile(tree, &self.registry)
    }

    pub fn parse(&self, conditions: &[CompiledCondition]) -> ConditionNode {
        parse(conditions)
    }

    /// Compiles a draft into a hook definition stamped at the current time.
    pub fn compile_hook(&self, draft: &HookDraft) -> Result<HookDefinition, CompileError> {
        self.compile_hook_at(draft, Utc::now())
    }

    /// Compiles a draft into a hook definition stamped at `now`.
    ///
    /// A draft loaded from an existing hook keeps its `created` time and bumps the version.
    pub fn compile_hook_at(
        &self,
        draft: &HookDraft,
        now: DateTime<Utc>,
    ) -> Result<HookDefinition, CompileError> {
        let conditions = self.compile(&draft.tree)?;
        let cards = draft.cards.iter().map(compile_card).collect::<Vec<_>>();
        let prefetch = prefetch::merge(
            prefetch::derive(&draft.tree, draft.trigger),
            &draft.prefetch,
        );

        let author = draft.author.clone();
        let meta = match &draft.origin {
            Some(origin) => HookMeta {
                version: origin.version + 1,
                created: origin.created,
                modified: now,
                author: author.or_else(|| origin.author.clone()),
            },
            None => HookMeta {
                version: 1,
                created: now,
                modified: now,
                author: author.or_else(|| self.default_author.clone()),
            },
        };

        let id = draft.hook_id();
        info!(
            hook_id = %id,
            conditions = conditions.len(),
            cards = cards.len(),
            version = meta.version,
            "Compiled hook definition"
        );
        Ok(HookDefinition {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            hook: draft.trigger,
            prefetch,
            conditions,
            cards,
            meta,
        })
    }

    /// Loads a hook definition back into an editable draft.
    pub fn parse_hook(&self, definition: &HookDefinition) -> HookDraft {
        let tree = parse(&definition.conditions);
        let derived = prefetch::derive(&tree, definition.hook);
        let authored = definition
            .prefetch
            .iter()
            .filter(|(key, query)| derived.get(*key) != Some(*query))
            .map(|(key, query)| (key.clone(), query.clone()))
            .collect();
        debug!(hook_id = %definition.id, "Parsed hook definition into draft");

        HookDraft {
            id: Some(definition.id.clone()),
            title: definition.title.clone(),
            description: definition.description.clone(),
            trigger: definition.hook,
            tree,
            cards: definition
                .cards
                .iter()
                .cloned()
                .map(CardDraft::from)
                .collect(),
            prefetch: authored,
            author: definition.meta.author.clone(),
            origin: Some(definition.meta.clone()),
        }
    }

    /// Parses canonical hook JSON into an editable draft.
    pub fn parse_hook_json(&self, json: &str) -> Result<HookDraft, CompileError> {
        let definition: HookDefinition =
            serde_json::from_str(json).map_err(|e| CompileError::JsonParseError(e.to_string()))?;
        Ok(self.parse_hook(&definition))
    }

    /// Checks that a definition's conditions are in compiled normal form with valid leaves
    /// and unique leaf ids.
    pub fn ensure_compiled(&self, definition: &HookDefinition) -> Result<(), CompileError> {
        normalize::check_normal_form(&definition.conditions, LogicalOperator::And, &self.registry)?;
        let mut seen: AHashSet<&NodeId> = AHashSet::new();
        for leaf in definition.conditions.iter().flat_map(|c| c.leaves()) {
            if !seen.insert(&leaf.id) {
                return Err(CompileError::Inconsistency {
                    node_id: leaf.id.to_string(),
                    message: "leaf id appears more than once".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, Leaf, Operand};
    use crate::registry::{Domain, Operator};

    fn leaf(id: &str, field: &str, value: i32) -> Leaf {
        Leaf::new(Domain::LabValue, field, Operator::Gt, Operand::single(value)).with_id(id)
    }

    #[test]
    fn empty_root_compiles_to_nothing() {
        let out = compile(&ConditionNode::empty_root(), &OperatorRegistry::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn single_child_or_group_is_unwrapped() {
        let tree: ConditionNode = Group::new(LogicalOperator::And)
            .with_child(Group::new(LogicalOperator::Or).with_child(leaf("a", "HbA1c", 7)))
            .into();
        let out = compile(&tree, &OperatorRegistry::new()).unwrap();
        assert_eq!(out, vec![CompiledCondition::Leaf(leaf("a", "HbA1c", 7))]);
    }

    #[test]
    fn lone_and_group_under_or_is_spliced() {
        let tree: ConditionNode = Group::new(LogicalOperator::And)
            .with_child(leaf("a", "HbA1c", 7))
            .with_child(
                Group::new(LogicalOperator::Or).with_child(
                    Group::new(LogicalOperator::And)
                        .with_child(leaf("b", "glucose", 180))
                        .with_child(leaf("c", "ldl", 160)),
                ),
            )
            .into();
        let out = compile(&tree, &OperatorRegistry::new()).unwrap();
        let ids: Vec<_> = out
            .iter()
            .filter_map(|c| c.as_leaf())
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_repairs_duplicate_leaf_ids() {
        let conditions = vec![
            CompiledCondition::Leaf(leaf("x", "HbA1c", 7)),
            CompiledCondition::Leaf(leaf("x", "glucose", 180)),
        ];
        let tree = parse(&conditions);
        assert!(tree.has_unique_ids());
        assert_eq!(tree.children()[0].id().as_str(), "x");
    }
}
