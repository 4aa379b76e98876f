use super::checks::check_leaf;
use super::grammar::{CompiledCondition, CompiledGroup};
use crate::error::CompileError;
use crate::model::{ConditionNode, Group, LogicalOperator, NodeId};
use crate::registry::OperatorRegistry;
use ahash::AHashSet;

/// Lowers `node` into `out`, the condition list of an enclosing group of `ambient`.
///
/// Empty groups vanish, single-child groups collapse into the child, and groups sharing
/// the ambient operator are spliced into the enclosing list.
pub(super) fn lower_node(
    node: &ConditionNode,
    ambient: LogicalOperator,
    registry: &OperatorRegistry,
    out: &mut Vec<CompiledCondition>,
) -> Result<(), CompileError> {
    match node {
        ConditionNode::Leaf(leaf) => {
            check_leaf(leaf, registry)?;
            out.push(CompiledCondition::Leaf(leaf.clone()));
        }
        ConditionNode::Group(group) => {
            let mut lowered = Vec::with_capacity(group.children.len());
            for child in &group.children {
                lower_node(child, group.operator, registry, &mut lowered)?;
            }
            match lowered.len() {
                0 => {}
                1 => match lowered.pop() {
                    // A lone nested group may now match the ambient operator.
                    Some(CompiledCondition::Group(inner)) if inner.operator == ambient => {
                        out.extend(inner.conditions);
                    }
                    Some(single) => out.push(single),
                    None => {}
                },
                _ if group.operator == ambient => out.extend(lowered),
                _ => out.push(CompiledCondition::Group(CompiledGroup {
                    operator: group.operator,
                    conditions: lowered,
                })),
            }
        }
    }
    Ok(())
}

/// Checks that `conditions` are already in compiled normal form under `ambient`.
pub(super) fn check_normal_form(
    conditions: &[CompiledCondition],
    ambient: LogicalOperator,
    registry: &OperatorRegistry,
) -> Result<(), CompileError> {
    for condition in conditions {
        match condition {
            CompiledCondition::Leaf(leaf) => check_leaf(leaf, registry)?,
            CompiledCondition::Group(group) => {
                if group.conditions.len() < 2 {
                    return Err(CompileError::MalformedGrammar(format!(
                        "{} group with {} condition(s) is not in normal form",
                        group.operator,
                        group.conditions.len()
                    )));
                }
                if group.operator == ambient {
                    return Err(CompileError::MalformedGrammar(format!(
                        "{} group nested directly in an {} list is not in normal form",
                        group.operator, ambient
                    )));
                }
                check_normal_form(&group.conditions, group.operator, registry)?;
            }
        }
    }
    Ok(())
}

/// Rebuilds an editable group from a compiled list. Groups get fresh ids; leaf ids are kept
/// unless they repeat.
pub(super) fn raise(
    conditions: &[CompiledCondition],
    operator: LogicalOperator,
    seen: &mut AHashSet<NodeId>,
) -> Group {
    let children = conditions
        .iter()
        .map(|condition| match condition {
            CompiledCondition::Leaf(leaf) => {
                let mut leaf = leaf.clone();
                if !seen.insert(leaf.id.clone()) {
                    leaf.id = NodeId::generate();
                    seen.insert(leaf.id.clone());
                }
                ConditionNode::Leaf(leaf)
            }
            CompiledCondition::Group(group) => {
                ConditionNode::Group(raise(&group.conditions, group.operator, seen))
            }
        })
        .collect::<Vec<_>>();
    Group::new(operator).with_children(children)
}
