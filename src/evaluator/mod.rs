//! Dry-run evaluation of condition trees against mock patient records.

use crate::compiler::{CompiledCondition, parse};
use crate::data::PatientContext;
use crate::error::EvaluationError;
use crate::model::ConditionNode;
use crate::registry::OperatorRegistry;
use crate::trace::{EvaluationTrace, TraceFormatter};

mod engine;

use engine::TreeEngine;

/// The result of an evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    /// Whether the hook would fire for this patient.
    pub matched: bool,
    /// A human-readable explanation of the logic that led to the result.
    pub reason: String,
    pub trace: EvaluationTrace,
}

/// Evaluates condition trees against patient records.
///
/// The evaluator mirrors what the execution service does with a compiled hook, closely
/// enough for authoring dry runs. It is not the production engine.
pub struct Evaluator<'a> {
    registry: &'a OperatorRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a OperatorRegistry) -> Self {
        Self { registry }
    }

    /// Evaluates `tree` for `patient`. A tree with nothing to evaluate always matches.
    ///
    /// # Returns
    ///
    /// * `Ok(EvaluationResult)`: `matched` tells whether the root condition holds.
    /// * `Err(EvaluationError)`: a leaf is incomplete or carries a value of the wrong type.
    pub fn evaluate(
        &self,
        tree: &ConditionNode,
        patient: &PatientContext,
    ) -> Result<EvaluationResult, EvaluationError> {
        let trace = TreeEngine::new(self.registry, patient).evaluate(tree)?;
        let matched = trace.outcome().unwrap_or(true);
        Ok(EvaluationResult {
            matched,
            reason: TraceFormatter::format_trace(&trace),
            trace,
        })
    }

    /// Evaluates a compiled condition list (an implicit AND).
    pub fn evaluate_compiled(
        &self,
        conditions: &[CompiledCondition],
        patient: &PatientContext,
    ) -> Result<EvaluationResult, EvaluationError> {
        self.evaluate(&parse(conditions), patient)
    }
}
