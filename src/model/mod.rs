//! The editable condition tree: a strictly owned recursive enum of groups and leaves.

mod display;
mod ids;
mod node;
mod operand;
mod record;

pub use display::DisplayTree;
pub use ids::{CardId, NodeId, SuggestionId};
pub use node::{
    ConditionNode, Group, Leaf, LogicalOperator, TimeUnit, Timeframe, TrendSettings,
};
pub use operand::{ConditionValue, Operand};
pub use record::LeafRecord;
