use super::node::ConditionNode;
use std::fmt;

/// A wrapper to print a condition tree with box-drawing connectors.
///
/// ```text
/// └── AND [root]
///     ├── HbA1c gt 7 within 90 days [a1c]
///     └── OR [g1]
///         └── age gte 50 [age]
/// ```
pub struct DisplayTree<'a> {
    pub node: &'a ConditionNode,
    pub show_ids: bool,
}

impl<'a> DisplayTree<'a> {
    pub fn new(node: &'a ConditionNode) -> Self {
        Self {
            node,
            show_ids: true,
        }
    }

    pub fn without_ids(mut self) -> Self {
        self.show_ids = false;
        self
    }

    fn fmt_as_tree(
        &self,
        node: &ConditionNode,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}", prefix, node_marker)?;
        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match node {
            ConditionNode::Leaf(leaf) => write!(f, "{}", leaf.describe())?,
            ConditionNode::Group(group) if group.children.is_empty() => {
                write!(f, "{} (empty)", group.operator)?
            }
            ConditionNode::Group(group) => write!(f, "{}", group.operator)?,
        }
        if self.show_ids {
            write!(f, " [{}]", node.id())?;
        }
        writeln!(f)?;

        let children = node.children();
        for (i, child) in children.iter().enumerate() {
            self.fmt_as_tree(child, f, &child_prefix, i + 1 == children.len())?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_as_tree(self.node, f, "", true)
    }
}
