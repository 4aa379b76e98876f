use super::ids::NodeId;
use super::operand::{ConditionValue, Operand};
use super::record::LeafRecord;
use crate::registry::{Domain, Operator};
use ahash::AHashSet;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit of a lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hours,
    Days,
}

/// A lookback window, e.g. "within 90 days".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeframe {
    pub value: u32,
    pub unit: TimeUnit,
}

impl Timeframe {
    pub const fn new(value: u32, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub const fn days(value: u32) -> Self {
        Self::new(value, TimeUnit::Days)
    }

    pub const fn hours(value: u32) -> Self {
        Self::new(value, TimeUnit::Hours)
    }

    pub fn as_delta(&self) -> TimeDelta {
        match self.unit {
            TimeUnit::Hours => TimeDelta::hours(i64::from(self.value)),
            TimeUnit::Days => TimeDelta::days(i64::from(self.value)),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match (self.unit, self.value) {
            (TimeUnit::Hours, 1) => "hour",
            (TimeUnit::Hours, _) => "hours",
            (TimeUnit::Days, 1) => "day",
            (TimeUnit::Days, _) => "days",
        };
        write!(f, "{} {}", self.value, unit)
    }
}

/// Auxiliary parameters of `trending_up` / `trending_down`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSettings {
    /// How many of the most recent readings must be strictly monotonic.
    pub min_readings: u32,
    /// Minimum relative change first to last, in percent. Vital signs only.
    pub threshold_percent: Option<f64>,
}

impl TrendSettings {
    pub const DEFAULT_MIN_READINGS: u32 = 3;
    pub const DEFAULT_THRESHOLD_PERCENT: f64 = 10.0;

    pub fn default_for(domain: Domain) -> Self {
        Self {
            min_readings: Self::DEFAULT_MIN_READINGS,
            threshold_percent: domain
                .supports_trend_threshold()
                .then_some(Self::DEFAULT_THRESHOLD_PERCENT),
        }
    }
}

/// Boolean combinator of a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("AND"),
            LogicalOperator::Or => f.write_str("OR"),
        }
    }
}

/// A single testable clinical fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LeafRecord", into = "LeafRecord")]
pub struct Leaf {
    pub id: NodeId,
    pub domain: Domain,
    pub field: Option<String>,
    pub operator: Operator,
    pub operand: Operand,
    pub timeframe: Option<Timeframe>,
    pub component: Option<String>,
    pub trend: Option<TrendSettings>,
}

impl Leaf {
    /// A complete leaf with a fresh id. Trend operators get the domain's default settings.
    pub fn new(domain: Domain, field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Self {
            id: NodeId::generate(),
            domain,
            field: Some(field.into()),
            operator,
            operand,
            timeframe: None,
            component: None,
            trend: operator.is_trend().then(|| TrendSettings::default_for(domain)),
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_trend(mut self, trend: TrendSettings) -> Self {
        self.trend = Some(trend);
        self
    }

    pub fn value(&self) -> Option<&ConditionValue> {
        self.operand.value()
    }

    pub fn value2(&self) -> Option<&ConditionValue> {
        self.operand.value2()
    }

    /// Field name including the component, e.g. `blood-pressure.systolic`.
    pub fn subject(&self) -> String {
        match (&self.field, &self.component) {
            (Some(field), Some(component)) => format!("{}.{}", field, component),
            (Some(field), None) => field.clone(),
            (None, _) => format!("<{}>", self.domain),
        }
    }

    /// Short human-readable description such as `HbA1c gt 7 within 90 days`.
    pub fn describe(&self) -> String {
        let mut text = format!("{} {}", self.subject(), self.operator);
        match &self.operand {
            Operand::None => {}
            Operand::Single(Some(value)) => text.push_str(&format!(" {}", value)),
            Operand::Single(None) => text.push_str(" ?"),
            Operand::Range(low, high) => text.push_str(&format!(" {}..{}", low, high)),
        }
        if let Some(timeframe) = &self.timeframe {
            text.push_str(&format!(" within {}", timeframe));
        }
        text
    }
}

/// A boolean combination of conditions. Child order is display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: NodeId,
    pub operator: LogicalOperator,
    #[serde(default)]
    pub children: Vec<ConditionNode>,
}

impl Group {
    pub fn new(operator: LogicalOperator) -> Self {
        Self {
            id: NodeId::generate(),
            operator,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_child(mut self, child: impl Into<ConditionNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = ConditionNode>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A node of the editable rule tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConditionNode {
    Leaf(Leaf),
    Group(Group),
}

impl From<Leaf> for ConditionNode {
    fn from(leaf: Leaf) -> Self {
        ConditionNode::Leaf(leaf)
    }
}

impl From<Group> for ConditionNode {
    fn from(group: Group) -> Self {
        ConditionNode::Group(group)
    }
}

impl Default for ConditionNode {
    fn default() -> Self {
        Self::empty_root()
    }
}

impl ConditionNode {
    /// A new tree: one empty AND group.
    pub fn empty_root() -> Self {
        ConditionNode::Group(Group::new(LogicalOperator::And))
    }

    pub fn id(&self) -> &NodeId {
        match self {
            ConditionNode::Leaf(leaf) => &leaf.id,
            ConditionNode::Group(group) => &group.id,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            ConditionNode::Group(group) => Some(group),
            ConditionNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            ConditionNode::Leaf(leaf) => Some(leaf),
            ConditionNode::Group(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ConditionNode::Group(_))
    }

    pub fn children(&self) -> &[ConditionNode] {
        match self {
            ConditionNode::Group(group) => &group.children,
            ConditionNode::Leaf(_) => &[],
        }
    }

    /// Depth-first search by id.
    pub fn find(&self, id: &NodeId) -> Option<&ConditionNode> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut ConditionNode> {
        if self.id() == id {
            return Some(self);
        }
        match self {
            ConditionNode::Group(group) => group.children.iter_mut().find_map(|c| c.find_mut(id)),
            ConditionNode::Leaf(_) => None,
        }
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// All ids in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(&mut |node| out.push(node.id().clone()));
        out
    }

    /// True when no id appears twice.
    pub fn has_unique_ids(&self) -> bool {
        let ids = self.ids();
        let unique: AHashSet<&NodeId> = ids.iter().collect();
        unique.len() == ids.len()
    }

    pub fn leaves(&self) -> Vec<&Leaf> {
        match self {
            ConditionNode::Leaf(leaf) => vec![leaf],
            ConditionNode::Group(group) => group.children.iter().flat_map(|c| c.leaves()).collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Number of nested group levels in this subtree (a lone leaf has 0, an empty group 1).
    pub fn group_height(&self) -> usize {
        match self {
            ConditionNode::Leaf(_) => 0,
            ConditionNode::Group(group) => {
                1 + group
                    .children
                    .iter()
                    .map(|c| c.group_height())
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Group nesting level of the node with `id`, counting the root group as 1.
    /// For a leaf this is the level of the group that holds it.
    pub fn level_of(&self, id: &NodeId) -> Option<usize> {
        fn search(node: &ConditionNode, id: &NodeId, level: usize) -> Option<usize> {
            match node {
                ConditionNode::Leaf(leaf) => (&leaf.id == id).then_some(level.saturating_sub(1)),
                ConditionNode::Group(group) => {
                    if &group.id == id {
                        return Some(level);
                    }
                    group
                        .children
                        .iter()
                        .find_map(|c| search(c, id, level + 1))
                }
            }
        }
        search(self, id, 1)
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ConditionNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Domains referenced by any leaf, deduplicated in first-seen order.
    pub fn domains(&self) -> Vec<Domain> {
        let mut seen = Vec::new();
        for leaf in self.leaves() {
            if !seen.contains(&leaf.domain) {
                seen.push(leaf.domain);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConditionNode {
        Group::new(LogicalOperator::And)
            .with_id("root")
            .with_child(Leaf::new(Domain::LabValue, "HbA1c", Operator::Gt, Operand::single(7)).with_id("a1c"))
            .with_child(
                Group::new(LogicalOperator::Or)
                    .with_id("inner")
                    .with_child(Leaf::new(Domain::Demographic, "age", Operator::Gte, Operand::single(50)).with_id("age")),
            )
            .into()
    }

    #[test]
    fn levels_count_groups_from_the_root() {
        let tree = sample();
        assert_eq!(tree.level_of(&"root".into()), Some(1));
        assert_eq!(tree.level_of(&"inner".into()), Some(2));
        assert_eq!(tree.level_of(&"a1c".into()), Some(1));
        assert_eq!(tree.level_of(&"age".into()), Some(2));
        assert_eq!(tree.group_height(), 2);
    }

    #[test]
    fn describe_leaf() {
        let leaf = Leaf::new(Domain::LabValue, "HbA1c", Operator::Gt, Operand::single(7))
            .with_timeframe(Timeframe::days(90));
        assert_eq!(leaf.describe(), "HbA1c gt 7 within 90 days");
    }

    #[test]
    fn tree_serializes_with_kind_tags() {
        let tree = sample();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["kind"], "group");
        assert_eq!(json["children"][0]["kind"], "leaf");
        assert_eq!(json["children"][0]["type"], "lab-value");
        let back: ConditionNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }
}
