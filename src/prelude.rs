//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the crate. Import it to get
//! the authoring, compilation and dry-run types without naming each one.
//!
//! # Example
//!
//! ```rust,no_run
//! use cds_rulebuilder::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/hook.json")?;
//! let compiler = HookCompiler::new();
//! let draft = compiler.parse_hook_json(&json)?;
//!
//! let patient = PatientContext::from_file("path/to/patient.json")?;
//! let result = Evaluator::new(compiler.registry()).evaluate(&draft.tree, &patient)?;
//! println!("{}", result.reason);
//! # Ok(())
//! # }
//! ```

// Authoring
pub use crate::editor::{self, GroupPatch, LeafPatch, NodePatch};
pub use crate::session::AuthoringSession;
pub use crate::validation::{ValidationReport, validate_draft};

// Model
pub use crate::cards::{Card, CardDraft, Indicator, Suggestion};
pub use crate::model::{
    ConditionNode, ConditionValue, DisplayTree, Group, Leaf, LogicalOperator, NodeId, Operand,
    Timeframe,
};
pub use crate::registry::{Domain, Operator, OperatorRegistry};

// Compilation
pub use crate::compiler::{CompiledCondition, HookCompiler};
pub use crate::hook::{HookDefinition, HookDraft, HookTrigger};

// Dry runs
pub use crate::data::PatientContext;
pub use crate::evaluator::{EvaluationResult, Evaluator};
pub use crate::trace::TraceFormatter;

// Configuration
pub use crate::config::BuilderConfig;

// Error types
pub use crate::error::{CompileError, EditError, EvaluationError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
