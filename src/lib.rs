//! # CDS Rule Builder - Clinical Decision Support Hook Authoring Core
//!
//! **cds-rulebuilder** is the model, editor and compiler behind a visual "if clinical
//! condition, then alert" rule builder. Authors assemble a tree of boolean groups and typed
//! condition leaves; the compiler turns it into the canonical hook grammar consumed by an
//! external hook-execution service, and parses that grammar back for editing.
//!
//! ## Core Workflow
//!
//! 1.  **Author**: Start from an empty draft (or a built-in template) and shape the tree with
//!     the pure functions in [`editor`], or through an [`session::AuthoringSession`] that adds
//!     undo/redo.
//! 2.  **Validate**: [`validation::validate_draft`] lists every problem at once.
//! 3.  **Compile**: [`compiler::HookCompiler`] emits a [`hook::HookDefinition`] in compiled
//!     normal form, with derived prefetch queries and versioned metadata.
//! 4.  **Dry run**: The [`evaluator::Evaluator`] checks the tree against a mock
//!     [`data::PatientContext`] and explains the outcome.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cds_rulebuilder::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let compiler = HookCompiler::builder().with_default_author("cds-team").build();
//!     let registry = compiler.registry();
//!
//!     // 1. Build the tree: HbA1c > 7 within the last 90 days.
//!     let tree = ConditionNode::empty_root();
//!     let (tree, leaf) = editor::add_leaf(&tree, tree.id(), Domain::LabValue, registry)?;
//!     let patch = LeafPatch::new()
//!         .field("HbA1c")
//!         .operator(Operator::Gt)
//!         .value(7)
//!         .timeframe(Timeframe::days(90));
//!     let tree = editor::update_node(&tree, &leaf, &patch.into(), registry)?;
//!
//!     // 2. Wrap it in a draft with a card and compile.
//!     let draft = HookDraft::new("HbA1c above target", HookTrigger::PatientView)
//!         .with_tree(tree)
//!         .with_card(Card::new("HbA1c above 7%", Indicator::Warning));
//!     let definition = compiler.compile_hook(&draft)?;
//!     println!("{}", definition.to_json_pretty()?);
//!
//!     // 3. Dry-run it against the built-in mock patient.
//!     let patient = PatientContext::default();
//!     let result = Evaluator::new(registry).evaluate(&draft.tree, &patient)?;
//!     println!("matched: {} because {}", result.matched, result.reason);
//!     Ok(())
//! }
//! ```

pub mod cards;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod data;
pub mod editor;
pub mod error;
pub mod evaluator;
pub mod execution;
pub mod hook;
pub mod model;
pub mod prelude;
pub mod registry;
pub mod session;
pub mod trace;
pub mod validation;
