//! Orchestration engine — executes pipelines against the registry.
//!
//! The engine:
//! 1. Resolves an agent for each step's required capability
//! 2. Builds the step request from the running context
//! 3. Calls the agent through its adapter under the step timeout
//! 4. Merges the output (real or fallback) back into the context
//! 5. Aggregates all step results into one report

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::adapter::{AdapterError, AdapterSet};
use crate::error::EngineError;
use crate::pipeline::{Pipeline, StepSpec, WorkflowContext};
use crate::registry::{AgentDescriptor, AgentRegistry};
use crate::report::{aggregate, StepResult, StepStatus, WorkflowReport};

/// Drives pipeline runs. Holds a registry handle, the immutable adapter
/// set, and the pipelines installed at startup. Independent concurrent runs
/// share nothing but the registry (read-only during a run) and the adapters.
pub struct Orchestrator {
    registry: AgentRegistry,
    adapters: AdapterSet,
    pipelines: HashMap<String, Pipeline>,
}

impl Orchestrator {
    pub fn new(registry: AgentRegistry, adapters: AdapterSet) -> Self {
        Self {
            registry,
            adapters,
            pipelines: HashMap::new(),
        }
    }

    /// Install a pipeline under its name. Last write wins.
    pub fn install_pipeline(&mut self, pipeline: Pipeline) {
        self.pipelines.insert(pipeline.name.clone(), pipeline);
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.install_pipeline(pipeline);
        self
    }

    pub fn pipeline_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pipelines.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.get(name)
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Register an agent with the engine's registry.
    pub async fn register_agent(&self, descriptor: AgentDescriptor) -> Result<(), EngineError> {
        self.registry.register(descriptor).await
    }

    pub fn adapters(&self) -> &AdapterSet {
        &self.adapters
    }

    /// Run an installed pipeline by name.
    pub async fn run_pipeline(
        &self,
        name: &str,
        input: Value,
    ) -> Result<WorkflowReport, EngineError> {
        let pipeline = self
            .pipelines
            .get(name)
            .ok_or_else(|| EngineError::NotFound(format!("pipeline '{}'", name)))?;
        Ok(self.run(pipeline, input).await)
    }

    /// Execute every step strictly in sequence and aggregate the report.
    ///
    /// A run always produces a report: agent failures degrade the step via
    /// its fallback, and only a failing fallback generator stops the run
    /// early (remaining steps never execute).
    pub async fn run(&self, pipeline: &Pipeline, input: Value) -> WorkflowReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut context = WorkflowContext::from_input(input);
        let mut results = Vec::with_capacity(pipeline.steps.len());

        tracing::info!(
            "[Engine] run {} starting pipeline '{}' ({} steps)",
            run_id,
            pipeline.name,
            pipeline.steps.len()
        );

        for (index, step) in pipeline.steps.iter().enumerate() {
            let result = self.execute_step(step, &mut context).await;
            tracing::info!(
                "[Engine] step {}/{} '{}' {:?} in {}ms",
                index + 1,
                pipeline.steps.len(),
                step.name,
                result.status,
                result.duration_ms
            );

            let failed = result.status == StepStatus::Failed;
            results.push(result);
            if failed {
                tracing::error!(
                    "[Engine] run {} aborted at step '{}': fallback generator failed",
                    run_id,
                    step.name
                );
                break;
            }
        }

        let report = aggregate(&pipeline.name, run_id, started_at, results, clock.elapsed());
        tracing::info!(
            "[Engine] run {} finished: {:?} ({}/{} steps completed, {}ms)",
            run_id,
            report.status,
            report.completed_steps(),
            report.steps.len(),
            report.total_duration_ms
        );
        report
    }

    /// Drive one step to a terminal state. Never errors: every outcome is a
    /// `StepResult`, and a `Failed` result tells the caller to stop the run.
    async fn execute_step(&self, step: &StepSpec, context: &mut WorkflowContext) -> StepResult {
        let started = Instant::now();

        let candidates = self.registry.find_by_capability(&step.required_capability).await;
        let descriptor = match candidates.into_iter().next() {
            Some(descriptor) => descriptor,
            None => {
                // Degrade without attempting any network call.
                tracing::warn!(
                    "[Engine] no agent registered for capability '{}'",
                    step.required_capability
                );
                return synthesize_fallback(
                    step,
                    context,
                    None,
                    format!(
                        "no agent registered for capability '{}'",
                        step.required_capability
                    ),
                    started,
                );
            }
        };

        let adapter = match self.adapters.get(&descriptor.agent_type) {
            Some(adapter) => adapter,
            None => {
                return synthesize_fallback(
                    step,
                    context,
                    Some(descriptor.agent_id.clone()),
                    format!(
                        "no adapter installed for agent type '{}'",
                        descriptor.agent_type
                    ),
                    started,
                );
            }
        };

        let request = (step.input_projection)(context);
        tracing::debug!(
            "[Engine] step '{}' invoking agent '{}' ({})",
            step.name,
            descriptor.agent_id,
            descriptor.agent_type
        );

        // The step deadline is enforced here regardless of what the adapter
        // does internally.
        let outcome =
            tokio::time::timeout(step.timeout, adapter.invoke(&descriptor.config, request)).await;

        match outcome {
            Ok(Ok(output)) => {
                context.insert(&step.output_merge_key, output.clone());
                StepResult {
                    step: step.name.clone(),
                    status: StepStatus::Completed,
                    agent_id: Some(descriptor.agent_id),
                    output,
                    duration_ms: started.elapsed().as_millis() as u64,
                    error: None,
                }
            }
            Ok(Err(err)) => synthesize_fallback(
                step,
                context,
                Some(descriptor.agent_id),
                err.to_string(),
                started,
            ),
            Err(_) => synthesize_fallback(
                step,
                context,
                Some(descriptor.agent_id),
                AdapterError::Timeout(step.timeout).to_string(),
                started,
            ),
        }
    }
}

/// Substitute a step's fallback output and mark it degraded, or mark the
/// step failed when the fallback generator itself errors.
fn synthesize_fallback(
    step: &StepSpec,
    context: &mut WorkflowContext,
    agent_id: Option<String>,
    detail: String,
    started: Instant,
) -> StepResult {
    match (step.fallback)(context) {
        Ok(output) => {
            context.insert(&step.output_merge_key, output.clone());
            StepResult {
                step: step.name.clone(),
                status: StepStatus::Degraded,
                agent_id,
                output,
                duration_ms: started.elapsed().as_millis() as u64,
                error: Some(detail),
            }
        }
        Err(err) => {
            let failure = EngineError::FallbackFailure {
                step: step.name.clone(),
                message: err.to_string(),
            };
            StepResult {
                step: step.name.clone(),
                status: StepStatus::Failed,
                agent_id,
                output: Value::Null,
                duration_ms: started.elapsed().as_millis() as u64,
                error: Some(failure.to_string()),
            }
        }
    }
}
