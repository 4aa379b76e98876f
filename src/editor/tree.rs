//! Structural helpers shared by the editor operations. All of them work on an owned copy.

use crate::error::EditError;
use crate::model::{ConditionNode, Group, NodeId};

/// The group with `id`, or `NotFound` / `NotAGroup`.
pub(super) fn group_mut<'a>(tree: &'a mut ConditionNode, id: &NodeId) -> Result<&'a mut Group, EditError> {
    match tree.find_mut(id) {
        Some(ConditionNode::Group(group)) => Ok(group),
        Some(ConditionNode::Leaf(_)) => Err(EditError::NotAGroup(id.clone())),
        None => Err(EditError::NotFound(id.clone())),
    }
}

pub(super) fn group_ref<'a>(tree: &'a ConditionNode, id: &NodeId) -> Result<&'a Group, EditError> {
    match tree.find(id) {
        Some(ConditionNode::Group(group)) => Ok(group),
        Some(ConditionNode::Leaf(_)) => Err(EditError::NotAGroup(id.clone())),
        None => Err(EditError::NotFound(id.clone())),
    }
}

/// Id of the group holding `id` and the child's position in it.
pub(super) fn parent_of(tree: &ConditionNode, id: &NodeId) -> Option<(NodeId, usize)> {
    let ConditionNode::Group(group) = tree else {
        return None;
    };
    if let Some(index) = group.children.iter().position(|c| c.id() == id) {
        return Some((group.id.clone(), index));
    }
    group.children.iter().find_map(|c| parent_of(c, id))
}

/// Rejects any operation that needs the node to have a parent.
pub(super) fn non_root_parent(
    tree: &ConditionNode,
    id: &NodeId,
    root_error: EditError,
) -> Result<(NodeId, usize), EditError> {
    if tree.id() == id {
        return Err(root_error);
    }
    parent_of(tree, id).ok_or_else(|| EditError::NotFound(id.clone()))
}

/// Removes the subtree rooted at `id` and returns it.
pub(super) fn detach(tree: &mut ConditionNode, id: &NodeId) -> Result<ConditionNode, EditError> {
    let (parent_id, index) = non_root_parent(tree, id, EditError::CannotRemoveRoot)?;
    let parent = group_mut(tree, &parent_id)?;
    Ok(parent.children.remove(index))
}

/// Inserts `node` into the group `parent_id` at `index` (`None` appends).
pub(super) fn insert(
    tree: &mut ConditionNode,
    parent_id: &NodeId,
    index: Option<usize>,
    node: ConditionNode,
) -> Result<(), EditError> {
    let parent = group_mut(tree, parent_id)?;
    let len = parent.children.len();
    let index = index.unwrap_or(len);
    if index > len {
        return Err(EditError::IndexOutOfBounds { index, len });
    }
    parent.children.insert(index, node);
    Ok(())
}

/// Gives every node in the subtree a fresh id.
pub(super) fn refresh_ids(node: &mut ConditionNode) {
    match node {
        ConditionNode::Leaf(leaf) => leaf.id = NodeId::generate(),
        ConditionNode::Group(group) => {
            group.id = NodeId::generate();
            group.children.iter_mut().for_each(refresh_ids);
        }
    }
}

/// Fails when a group subtree of `height` levels placed under a group at `parent_level`
/// would exceed `max_depth`.
pub(super) fn check_depth(parent_level: usize, height: usize, max_depth: usize) -> Result<(), EditError> {
    let depth = parent_level + height;
    if height > 0 && depth > max_depth {
        Err(EditError::DepthExceeded { depth, max_depth })
    } else {
        Ok(())
    }
}
