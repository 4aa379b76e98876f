//! Boundary to the external hook-execution service.
//!
//! The core hands over a definition already in compiled normal form and returns whatever
//! the service answers, unchanged. There is no retry.

use crate::cards::Card;
use crate::compiler::HookCompiler;
use crate::data::PatientContext;
use crate::error::{ExecutionError, TestHookError};
use crate::evaluator::Evaluator;
use crate::hook::{HookDefinition, HookDraft};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the execution service returns for a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub cards: Vec<Card>,
    pub execution_time_ms: u64,
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub prefetch_result: serde_json::Value,
}

/// A service able to run a compiled hook for one patient.
pub trait HookExecutor {
    fn execute(
        &self,
        definition: &HookDefinition,
        patient_id: &str,
    ) -> Result<ExecutionResponse, ExecutionError>;
}

/// Runs `definition` for `patient_id` after checking it is in compiled normal form.
pub fn test_hook(
    executor: &dyn HookExecutor,
    compiler: &HookCompiler,
    definition: &HookDefinition,
    patient_id: &str,
) -> Result<ExecutionResponse, TestHookError> {
    let patient_id = patient_id.trim();
    if patient_id.is_empty() {
        return Err(TestHookError::MissingPatient);
    }
    compiler.ensure_compiled(definition)?;

    info!(hook_id = %definition.id, patient_id, "Testing hook");
    let response = executor.execute(definition, patient_id).map_err(|err| {
        warn!(hook_id = %definition.id, error = %err, "Hook execution failed");
        err
    })?;
    debug!(
        cards = response.cards.len(),
        execution_time_ms = response.execution_time_ms,
        "Hook execution finished"
    );
    Ok(response)
}

/// Compiles `draft` and tests the result.
pub fn test_draft(
    executor: &dyn HookExecutor,
    compiler: &HookCompiler,
    draft: &HookDraft,
    patient_id: &str,
) -> Result<ExecutionResponse, TestHookError> {
    let definition = compiler.compile_hook(draft)?;
    test_hook(executor, compiler, &definition, patient_id)
}

/// An in-process executor backed by mock patients and the dry-run evaluator.
pub struct DryRunExecutor {
    compiler: HookCompiler,
    patients: HashMap<String, PatientContext>,
}

impl DryRunExecutor {
    pub fn new(compiler: HookCompiler) -> Self {
        Self {
            compiler,
            patients: HashMap::new(),
        }
    }

    pub fn with_patient(mut self, patient: PatientContext) -> Self {
        self.patients.insert(patient.patient_id.clone(), patient);
        self
    }
}

impl HookExecutor for DryRunExecutor {
    fn execute(
        &self,
        definition: &HookDefinition,
        patient_id: &str,
    ) -> Result<ExecutionResponse, ExecutionError> {
        let started = Instant::now();
        let patient = self.patients.get(patient_id).ok_or_else(|| ExecutionError {
            message: format!("Patient '{}' not found", patient_id),
            status: Some(404),
            details: None,
        })?;

        let evaluator = Evaluator::new(self.compiler.registry());
        let result = evaluator
            .evaluate_compiled(&definition.conditions, patient)
            .map_err(|err| ExecutionError {
                message: err.to_string(),
                status: Some(422),
                details: None,
            })?;

        let cards = if result.matched {
            definition.cards.clone()
        } else {
            Vec::new()
        };
        Ok(ExecutionResponse {
            cards,
            execution_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            context: json!({ "patientId": patient_id, "hook": definition.hook }),
            prefetch_result: json!({ "reason": result.reason }),
        })
    }
}

/// Identifies one started test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestTicket {
    seq: u64,
    patient_id: String,
}

impl TestTicket {
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }
}

/// Decides whether a finished test run still matters.
///
/// A response is stale once any later run has been started for a different patient,
/// even if the patient was switched back afterwards.
#[derive(Debug, Default)]
pub struct TestRunTracker {
    next_seq: u64,
    latest_patient: Option<String>,
    /// Sequence of the most recent run whose patient differs from the run before it.
    last_switch: u64,
}

impl TestRunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, patient_id: impl Into<String>) -> TestTicket {
        self.next_seq += 1;
        let patient_id = patient_id.into();
        if self
            .latest_patient
            .as_ref()
            .is_some_and(|previous| *previous != patient_id)
        {
            self.last_switch = self.next_seq;
        }
        self.latest_patient = Some(patient_id.clone());
        TestTicket {
            seq: self.next_seq,
            patient_id,
        }
    }

    pub fn is_stale(&self, ticket: &TestTicket) -> bool {
        ticket.seq > self.next_seq || self.last_switch > ticket.seq
    }

    /// Passes the result through unless the ticket is stale.
    pub fn accept<T>(&self, ticket: &TestTicket, result: T) -> Option<T> {
        if self.is_stale(ticket) {
            debug!(patient_id = %ticket.patient_id, "Ignoring stale test response");
            None
        } else {
            Some(result)
        }
    }
}
