//! Pure editing operations over the condition tree.
//!
//! Every operation takes the current tree by reference and returns a new one. On error
//! nothing is returned, so a rejected edit cannot leave a half-applied tree behind.

mod patch;
mod tree;

pub use patch::{GroupPatch, LeafPatch, NodePatch};

use crate::config::EditorConfig;
use crate::error::EditError;
use crate::model::{ConditionNode, Group, Leaf, LogicalOperator, NodeId, TrendSettings};
use crate::registry::{Domain, OperatorRegistry};
use tree::{check_depth, detach, group_mut, group_ref, insert, non_root_parent, refresh_ids};

/// Appends a blank leaf of `domain` to the group `parent_id`.
///
/// The leaf has no field yet and starts with the domain's first operator. A default
/// timeframe is only attached when that operator needs one.
pub fn add_leaf(
    tree: &ConditionNode,
    parent_id: &NodeId,
    domain: Domain,
    registry: &OperatorRegistry,
) -> Result<(ConditionNode, NodeId), EditError> {
    let operator = registry.default_operator(domain, None)?;
    let leaf = Leaf {
        id: NodeId::generate(),
        domain,
        field: None,
        operator,
        operand: patch::blank_operand(operator)?,
        timeframe: if operator.requires_timeframe() {
            domain.default_timeframe()
        } else {
            None
        },
        component: None,
        trend: operator.is_trend().then(|| TrendSettings::default_for(domain)),
    };
    let id = leaf.id.clone();

    let mut next = tree.clone();
    group_mut(&mut next, parent_id)?.children.push(leaf.into());
    Ok((next, id))
}

/// Appends an empty subgroup to `parent_id`.
pub fn add_group(
    tree: &ConditionNode,
    parent_id: &NodeId,
    operator: LogicalOperator,
    config: &EditorConfig,
) -> Result<(ConditionNode, NodeId), EditError> {
    group_ref(tree, parent_id)?;
    let parent_level = tree
        .level_of(parent_id)
        .ok_or_else(|| EditError::NotFound(parent_id.clone()))?;
    check_depth(parent_level, 1, config.max_depth)?;

    let group = Group::new(operator);
    let id = group.id.clone();
    let mut next = tree.clone();
    group_mut(&mut next, parent_id)?.children.push(group.into());
    Ok((next, id))
}

/// Replaces the node `id` with a patched copy, re-validating operator and arity.
pub fn update_node(
    tree: &ConditionNode,
    id: &NodeId,
    patch: &NodePatch,
    registry: &OperatorRegistry,
) -> Result<ConditionNode, EditError> {
    let mut next = tree.clone();
    let node = next
        .find_mut(id)
        .ok_or_else(|| EditError::NotFound(id.clone()))?;
    match (node, patch) {
        (ConditionNode::Leaf(leaf), NodePatch::Leaf(patch)) => {
            *leaf = patch::apply_leaf_patch(leaf, patch, registry)?;
        }
        (ConditionNode::Group(group), NodePatch::Group(patch)) => {
            if let Some(operator) = patch.operator {
                group.operator = operator;
            }
        }
        _ => return Err(EditError::KindMismatch(id.clone())),
    }
    Ok(next)
}

/// Removes the node and its subtree. A group emptied this way stays in place.
pub fn remove_node(tree: &ConditionNode, id: &NodeId) -> Result<ConditionNode, EditError> {
    let mut next = tree.clone();
    detach(&mut next, id)?;
    Ok(next)
}

/// Deep-copies the node with fresh ids at every level and inserts the copy right after
/// the original. Returns the new tree and the copy's id.
pub fn duplicate_node(tree: &ConditionNode, id: &NodeId) -> Result<(ConditionNode, NodeId), EditError> {
    let (parent_id, index) = non_root_parent(tree, id, EditError::RootImmutable)?;
    let mut copy = tree
        .find(id)
        .cloned()
        .ok_or_else(|| EditError::NotFound(id.clone()))?;
    refresh_ids(&mut copy);
    let copy_id = copy.id().clone();

    let mut next = tree.clone();
    insert(&mut next, &parent_id, Some(index + 1), copy)?;
    Ok((next, copy_id))
}

/// Moves the child at `from` to position `to` within the same group.
pub fn reorder(
    tree: &ConditionNode,
    parent_id: &NodeId,
    from: usize,
    to: usize,
) -> Result<ConditionNode, EditError> {
    let mut next = tree.clone();
    let parent = group_mut(&mut next, parent_id)?;
    let len = parent.children.len();
    for index in [from, to] {
        if index >= len {
            return Err(EditError::IndexOutOfBounds { index, len });
        }
    }
    let child = parent.children.remove(from);
    parent.children.insert(to, child);
    Ok(next)
}

/// Moves a node under another group at `index` (`None` appends).
///
/// Rejects moving the root, moving a node into its own subtree, and moves that would
/// push a group past the depth cap.
pub fn move_node(
    tree: &ConditionNode,
    id: &NodeId,
    new_parent_id: &NodeId,
    index: Option<usize>,
    config: &EditorConfig,
) -> Result<ConditionNode, EditError> {
    non_root_parent(tree, id, EditError::RootImmutable)?;
    group_ref(tree, new_parent_id)?;
    let moving = tree.find(id).ok_or_else(|| EditError::NotFound(id.clone()))?;
    if moving.contains(new_parent_id) {
        return Err(EditError::InvalidMove { node_id: id.clone() });
    }

    let mut next = tree.clone();
    let node = detach(&mut next, id)?;
    let parent_level = next
        .level_of(new_parent_id)
        .ok_or_else(|| EditError::NotFound(new_parent_id.clone()))?;
    check_depth(parent_level, node.group_height(), config.max_depth)?;
    insert(&mut next, new_parent_id, index, node)?;
    Ok(next)
}

/// Replaces the node with a new group of `operator` that holds it.
pub fn wrap_in_group(
    tree: &ConditionNode,
    id: &NodeId,
    operator: LogicalOperator,
    config: &EditorConfig,
) -> Result<(ConditionNode, NodeId), EditError> {
    let (parent_id, index) = non_root_parent(tree, id, EditError::RootImmutable)?;
    let parent_level = tree
        .level_of(&parent_id)
        .ok_or_else(|| EditError::NotFound(parent_id.clone()))?;
    let wrapped_height = tree.find(id).map_or(0, |n| n.group_height()) + 1;
    check_depth(parent_level, wrapped_height, config.max_depth)?;

    let mut next = tree.clone();
    let parent = group_mut(&mut next, &parent_id)?;
    let node = parent.children.remove(index);
    let wrapper = Group::new(operator).with_child(node);
    let wrapper_id = wrapper.id.clone();
    parent.children.insert(index, wrapper.into());
    Ok((next, wrapper_id))
}

/// Splices the children of group `id` into its parent at the group's position.
pub fn unwrap_group(tree: &ConditionNode, id: &NodeId) -> Result<ConditionNode, EditError> {
    let (parent_id, index) = non_root_parent(tree, id, EditError::RootImmutable)?;
    group_ref(tree, id)?;

    let mut next = tree.clone();
    let parent = group_mut(&mut next, &parent_id)?;
    let ConditionNode::Group(group) = parent.children.remove(index) else {
        return Err(EditError::NotAGroup(id.clone()));
    };
    parent.children.splice(index..index, group.children);
    Ok(next)
}
