//! An authoring session: one draft, the operations on it, and undo/redo.

use crate::cards::{self, CardDraft, CardPatch};
use crate::compiler::HookCompiler;
use crate::config::BuilderConfig;
use crate::editor::{self, NodePatch};
use crate::error::{CardError, CompileError, EditError};
use crate::hook::{HookDefinition, HookDraft, HookTemplate, HookTrigger};
use crate::model::{CardId, ConditionNode, LogicalOperator, NodeId};
use crate::registry::Domain;
use crate::validation::{ValidationReport, validate_draft};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    tree: ConditionNode,
    cards: Vec<CardDraft>,
    trigger: HookTrigger,
    title: String,
    description: String,
}

/// Owns a draft and applies editor and card operations to it.
///
/// Each successful operation pushes the previous tree, cards, trigger, title and
/// description onto the undo stack and clears the redo stack. A failed operation changes
/// nothing.
pub struct AuthoringSession {
    compiler: HookCompiler,
    config: BuilderConfig,
    draft: HookDraft,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
}

impl AuthoringSession {
    pub fn new(compiler: HookCompiler, config: BuilderConfig, draft: HookDraft) -> Self {
        let mut draft = draft;
        if draft.author.is_none() {
            draft.author = config.default_author.clone();
        }
        Self {
            compiler,
            config,
            draft,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Opens an existing hook for editing.
    pub fn open(compiler: HookCompiler, config: BuilderConfig, definition: &HookDefinition) -> Self {
        let draft = compiler.parse_hook(definition);
        info!(hook_id = %definition.id, version = definition.meta.version, "Opened hook for editing");
        Self::new(compiler, config, draft)
    }

    pub fn draft(&self) -> &HookDraft {
        &self.draft
    }

    pub fn tree(&self) -> &ConditionNode {
        &self.draft.tree
    }

    pub fn root_id(&self) -> NodeId {
        self.draft.tree.id().clone()
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let mut next = self.snapshot();
        next.title = title.into();
        self.commit(next);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let mut next = self.snapshot();
        next.description = description.into();
        self.commit(next);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            tree: self.draft.tree.clone(),
            cards: self.draft.cards.clone(),
            trigger: self.draft.trigger,
            title: self.draft.title.clone(),
            description: self.draft.description.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.draft.tree = snapshot.tree;
        self.draft.cards = snapshot.cards;
        self.draft.trigger = snapshot.trigger;
        self.draft.title = snapshot.title;
        self.draft.description = snapshot.description;
    }

    fn commit(&mut self, next: Snapshot) {
        let previous = self.snapshot();
        if previous == next {
            return;
        }
        self.undo.push(previous);
        self.redo.clear();
        self.restore(next);
    }

    fn commit_tree(&mut self, tree: ConditionNode) {
        let mut next = self.snapshot();
        next.tree = tree;
        self.commit(next);
    }

    fn commit_cards(&mut self, cards: Vec<CardDraft>) {
        let mut next = self.snapshot();
        next.cards = cards;
        self.commit(next);
    }

    pub fn add_leaf(&mut self, parent_id: &NodeId, domain: Domain) -> Result<NodeId, EditError> {
        let (tree, id) = editor::add_leaf(&self.draft.tree, parent_id, domain, self.compiler.registry())?;
        self.commit_tree(tree);
        Ok(id)
    }

    pub fn add_group(&mut self, parent_id: &NodeId, operator: LogicalOperator) -> Result<NodeId, EditError> {
        let (tree, id) = editor::add_group(&self.draft.tree, parent_id, operator, &self.config.editor)?;
        self.commit_tree(tree);
        Ok(id)
    }

    pub fn update_node(&mut self, id: &NodeId, patch: impl Into<NodePatch>) -> Result<(), EditError> {
        let tree = editor::update_node(&self.draft.tree, id, &patch.into(), self.compiler.registry())?;
        self.commit_tree(tree);
        Ok(())
    }

    pub fn remove_node(&mut self, id: &NodeId) -> Result<(), EditError> {
        let tree = editor::remove_node(&self.draft.tree, id)?;
        self.commit_tree(tree);
        Ok(())
    }

    pub fn duplicate_node(&mut self, id: &NodeId) -> Result<NodeId, EditError> {
        let (tree, copy) = editor::duplicate_node(&self.draft.tree, id)?;
        self.commit_tree(tree);
        Ok(copy)
    }

    pub fn reorder(&mut self, parent_id: &NodeId, from: usize, to: usize) -> Result<(), EditError> {
        let tree = editor::reorder(&self.draft.tree, parent_id, from, to)?;
        self.commit_tree(tree);
        Ok(())
    }

    pub fn move_node(&mut self, id: &NodeId, new_parent_id: &NodeId, index: Option<usize>) -> Result<(), EditError> {
        let tree = editor::move_node(&self.draft.tree, id, new_parent_id, index, &self.config.editor)?;
        self.commit_tree(tree);
        Ok(())
    }

    pub fn wrap_in_group(&mut self, id: &NodeId, operator: LogicalOperator) -> Result<NodeId, EditError> {
        let (tree, group) = editor::wrap_in_group(&self.draft.tree, id, operator, &self.config.editor)?;
        self.commit_tree(tree);
        Ok(group)
    }

    pub fn unwrap_group(&mut self, id: &NodeId) -> Result<(), EditError> {
        let tree = editor::unwrap_group(&self.draft.tree, id)?;
        self.commit_tree(tree);
        Ok(())
    }

    pub fn add_card(&mut self) -> CardId {
        let (cards, id) = cards::add_card(&self.draft.cards);
        self.commit_cards(cards);
        id
    }

    pub fn update_card(&mut self, id: &CardId, patch: &CardPatch) -> Result<(), CardError> {
        let cards = cards::update_card(&self.draft.cards, id, patch)?;
        self.commit_cards(cards);
        Ok(())
    }

    pub fn remove_card(&mut self, id: &CardId) -> Result<(), CardError> {
        let cards = cards::remove_card(&self.draft.cards, id)?;
        self.commit_cards(cards);
        Ok(())
    }

    pub fn duplicate_card(&mut self, id: &CardId) -> Result<CardId, CardError> {
        let (cards, copy) = cards::duplicate_card(&self.draft.cards, id)?;
        self.commit_cards(cards);
        Ok(copy)
    }

    /// Replaces tree, cards and trigger with a fresh copy of the template. Undoable as one step.
    pub fn apply_template(&mut self, template: &HookTemplate) {
        let applied = template.apply(&self.draft);
        debug!(template = template.id, "Applying hook template");
        self.commit(Snapshot {
            tree: applied.tree,
            cards: applied.cards,
            trigger: applied.trigger,
            title: applied.title,
            description: applied.description,
        });
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo.push(current);
        self.restore(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo.push(current);
        self.restore(next);
        true
    }

    pub fn validate(&self) -> ValidationReport {
        validate_draft(&self.draft, self.compiler.registry(), &self.config.editor)
    }

    /// Compiles the draft. After a successful compile the draft tracks the new metadata,
    /// so compiling again bumps the version.
    pub fn compile(&mut self) -> Result<HookDefinition, CompileError> {
        let definition = self.compiler.compile_hook(&self.draft)?;
        self.draft.id = Some(definition.id.clone());
        self.draft.origin = Some(definition.meta.clone());
        Ok(definition)
    }
}
