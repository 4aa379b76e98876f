//! The canonical condition grammar consumed by the hook-execution service.
//!
//! A condition list is an implicit AND. Each element is either a bare leaf or an explicit
//! `{ "operator": "AND" | "OR", "conditions": [...] }` group.

use crate::model::{Leaf, LogicalOperator};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompiledCondition {
    Group(CompiledGroup),
    Leaf(Leaf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledGroup {
    pub operator: LogicalOperator,
    pub conditions: Vec<CompiledCondition>,
}

impl CompiledCondition {
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            CompiledCondition::Leaf(leaf) => Some(leaf),
            CompiledCondition::Group(_) => None,
        }
    }

    /// Leaves in document order.
    pub fn leaves(&self) -> Vec<&Leaf> {
        match self {
            CompiledCondition::Leaf(leaf) => vec![leaf],
            CompiledCondition::Group(group) => {
                group.conditions.iter().flat_map(|c| c.leaves()).collect()
            }
        }
    }
}

impl From<Leaf> for CompiledCondition {
    fn from(leaf: Leaf) -> Self {
        CompiledCondition::Leaf(leaf)
    }
}

// Dispatch on the `conditions` key so a broken leaf reports its own error instead of
// "data did not match any variant".
impl<'de> Deserialize<'de> for CompiledCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let serde_json::Value::Object(map) = &value else {
            return Err(D::Error::custom(format!(
                "expected a condition object, found {}",
                value
            )));
        };
        if map.contains_key("conditions") {
            CompiledGroup::deserialize(value)
                .map(CompiledCondition::Group)
                .map_err(D::Error::custom)
        } else {
            Leaf::deserialize(value)
                .map(CompiledCondition::Leaf)
                .map_err(D::Error::custom)
        }
    }
}
