//! Per-step results and the aggregated run report.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Terminal state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The agent returned a value before the step timeout.
    Completed,
    /// The real agent call failed (or no agent resolved) and the step's
    /// fallback output was substituted.
    Degraded,
    /// The fallback generator itself failed; the run stopped here.
    Failed,
}

/// Overall run verdict, aggregated by precedence
/// `failure > partial_success > success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialSuccess,
    Failure,
}

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub status: StepStatus,

    /// Agent that served the step; `None` when no agent resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// The step's structured output, possibly fallback-sourced.
    pub output: Value,

    pub duration_ms: u64,

    /// Present only when the step degraded or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The unified, auditable result of one pipeline run. Immutable once the
/// run completes; owned by the caller that initiated it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub run_id: Uuid,
    pub pipeline: String,
    pub status: RunStatus,
    pub steps: Vec<StepResult>,
    pub started_at: DateTime<Utc>,
    pub total_duration_ms: u64,
}

impl WorkflowReport {
    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.step == name)
    }

    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count()
    }
}

/// Build the final report from the per-step results. Pure; no I/O.
pub fn aggregate(
    pipeline: &str,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    steps: Vec<StepResult>,
    total: Duration,
) -> WorkflowReport {
    WorkflowReport {
        run_id,
        pipeline: pipeline.to_string(),
        status: overall_status(&steps),
        steps,
        started_at,
        total_duration_ms: total.as_millis() as u64,
    }
}

fn overall_status(steps: &[StepResult]) -> RunStatus {
    if steps.iter().any(|s| s.status == StepStatus::Failed) {
        RunStatus::Failure
    } else if steps.iter().any(|s| s.status == StepStatus::Degraded) {
        RunStatus::PartialSuccess
    } else {
        RunStatus::Success
    }
}
