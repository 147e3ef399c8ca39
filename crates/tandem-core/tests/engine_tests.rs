//! Integration tests driving the orchestration engine end-to-end with
//! in-process stub adapters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use tandem_core::{
    AdapterError, AdapterSet, AgentAdapter, AgentConfig, AgentDescriptor, AgentRegistry,
    EngineError, FallbackError, Orchestrator, Pipeline, RunStatus, StepSpec, StepStatus,
};

struct StaticAdapter {
    output: Value,
}

#[async_trait]
impl AgentAdapter for StaticAdapter {
    async fn invoke(&self, _config: &AgentConfig, _request: Value) -> Result<Value, AdapterError> {
        Ok(self.output.clone())
    }

    async fn health(&self, _config: &AgentConfig) -> bool {
        true
    }
}

/// Returns the projected request untouched, so tests can observe exactly
/// what a downstream step was fed.
struct EchoAdapter;

#[async_trait]
impl AgentAdapter for EchoAdapter {
    async fn invoke(&self, _config: &AgentConfig, request: Value) -> Result<Value, AdapterError> {
        Ok(request)
    }

    async fn health(&self, _config: &AgentConfig) -> bool {
        true
    }
}

struct FailingAdapter;

#[async_trait]
impl AgentAdapter for FailingAdapter {
    async fn invoke(&self, _config: &AgentConfig, _request: Value) -> Result<Value, AdapterError> {
        Err(AdapterError::Other("vendor exploded".to_string()))
    }

    async fn health(&self, _config: &AgentConfig) -> bool {
        false
    }
}

struct SlowAdapter {
    delay: Duration,
}

#[async_trait]
impl AgentAdapter for SlowAdapter {
    async fn invoke(&self, _config: &AgentConfig, _request: Value) -> Result<Value, AdapterError> {
        tokio::time::sleep(self.delay).await;
        Ok(json!("too late"))
    }

    async fn health(&self, _config: &AgentConfig) -> bool {
        true
    }
}

struct CountingAdapter {
    calls: Arc<AtomicUsize>,
    output: Value,
}

#[async_trait]
impl AgentAdapter for CountingAdapter {
    async fn invoke(&self, _config: &AgentConfig, _request: Value) -> Result<Value, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }

    async fn health(&self, _config: &AgentConfig) -> bool {
        true
    }
}

fn agent(id: &str, agent_type: &str, capability: &str) -> AgentDescriptor {
    AgentDescriptor::new(id, agent_type).with_capability(capability)
}

#[tokio::test]
async fn all_completed_steps_aggregate_to_success() {
    let adapters = AdapterSet::new()
        .with(
            "profile_stub",
            Arc::new(StaticAdapter {
                output: json!({"segment": "residential"}),
            }),
        )
        .with(
            "advice_stub",
            Arc::new(StaticAdapter {
                output: json!({"programs": ["led_retrofit"]}),
            }),
        );

    let pipeline = Pipeline::new("consult")
        .step(StepSpec::new("profile", "customer_processing", "customer_profile"))
        .step(StepSpec::new("advise", "energy_consultation", "recommendations"));

    let orchestrator = Orchestrator::new(AgentRegistry::new(), adapters).with_pipeline(pipeline);
    orchestrator
        .register_agent(agent("profiler", "profile_stub", "customer_processing"))
        .await
        .unwrap();
    orchestrator
        .register_agent(agent("advisor", "advice_stub", "energy_consultation"))
        .await
        .unwrap();

    let report = orchestrator
        .run_pipeline("consult", json!({"customer_id": "12345"}))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.steps.len(), 2);
    assert!(report.steps.iter().all(|s| s.status == StepStatus::Completed));
    assert_eq!(report.steps[0].step, "profile");
    assert_eq!(report.steps[0].agent_id.as_deref(), Some("profiler"));
    assert_eq!(report.steps[1].output, json!({"programs": ["led_retrofit"]}));
}

#[tokio::test]
async fn failing_step_degrades_and_later_steps_consume_fallback() {
    let registry = AgentRegistry::new();
    registry
        .register(agent("profiler", "profile_stub", "customer_processing"))
        .await
        .unwrap();
    registry
        .register(agent("enricher", "broken", "enterprise_data_enrichment"))
        .await
        .unwrap();
    registry
        .register(agent("validator", "echo", "recommendation_validation"))
        .await
        .unwrap();

    let adapters = AdapterSet::new()
        .with(
            "profile_stub",
            Arc::new(StaticAdapter {
                output: json!({"segment": "residential"}),
            }),
        )
        .with("broken", Arc::new(FailingAdapter))
        .with("echo", Arc::new(EchoAdapter));

    let pipeline = Pipeline::new("consult")
        .step(StepSpec::new("profile", "customer_processing", "customer_profile"))
        .step(
            StepSpec::new("enrich", "enterprise_data_enrichment", "enterprise_data")
                .with_fallback(|_| Ok(json!({"billing": "unknown", "synthetic": true}))),
        )
        // Default projection: the validator sees the whole context.
        .step(StepSpec::new("validate", "recommendation_validation", "validation"));

    let orchestrator = Orchestrator::new(registry, adapters).with_pipeline(pipeline);
    let report = orchestrator
        .run_pipeline("consult", json!({"customer_id": "12345"}))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::PartialSuccess);

    let enrich = report.step("enrich").unwrap();
    assert_eq!(enrich.status, StepStatus::Degraded);
    assert_eq!(enrich.agent_id.as_deref(), Some("enricher"));
    assert_eq!(enrich.output, json!({"billing": "unknown", "synthetic": true}));
    assert!(enrich.error.as_deref().unwrap().contains("vendor exploded"));

    // The degraded output flowed into the next step's request.
    let validate = report.step("validate").unwrap();
    assert_eq!(validate.status, StepStatus::Completed);
    assert_eq!(
        validate.output["enterprise_data"],
        json!({"billing": "unknown", "synthetic": true})
    );
    assert_eq!(validate.output["customer_profile"], json!({"segment": "residential"}));
}

#[tokio::test]
async fn missing_capability_degrades_without_any_agent_call() {
    let registry = AgentRegistry::new();
    registry
        .register(agent("profiler", "counting", "customer_processing"))
        .await
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let adapters = AdapterSet::new().with(
        "counting",
        Arc::new(CountingAdapter {
            calls: calls.clone(),
            output: json!({"segment": "residential"}),
        }),
    );

    let pipeline = Pipeline::new("consult")
        .step(StepSpec::new("profile", "customer_processing", "customer_profile"))
        .step(
            StepSpec::new("advise", "energy_consultation", "recommendations")
                .with_fallback(|_| Ok(json!({"programs": [], "synthetic": true}))),
        );

    let orchestrator = Orchestrator::new(registry, adapters).with_pipeline(pipeline);
    let report = orchestrator.run_pipeline("consult", json!({})).await.unwrap();

    assert_eq!(report.status, RunStatus::PartialSuccess);
    assert_eq!(report.steps[0].status, StepStatus::Completed);

    let advise = report.step("advise").unwrap();
    assert_eq!(advise.status, StepStatus::Degraded);
    assert_eq!(advise.agent_id, None);
    assert!(advise
        .error
        .as_deref()
        .unwrap()
        .contains("no agent registered for capability 'energy_consultation'"));

    // Only the first step ever reached an adapter.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn step_exceeding_timeout_degrades() {
    let registry = AgentRegistry::new();
    registry
        .register(agent("sleeper", "slow", "energy_consultation"))
        .await
        .unwrap();

    let adapters = AdapterSet::new().with(
        "slow",
        Arc::new(SlowAdapter {
            delay: Duration::from_millis(200),
        }),
    );

    let pipeline = Pipeline::new("consult").step(
        StepSpec::new("advise", "energy_consultation", "recommendations")
            .with_timeout(Duration::from_millis(20))
            .with_fallback(|_| Ok(json!({"programs": [], "synthetic": true}))),
    );

    let orchestrator = Orchestrator::new(registry, adapters).with_pipeline(pipeline);
    let report = orchestrator.run_pipeline("consult", json!({})).await.unwrap();

    assert_eq!(report.status, RunStatus::PartialSuccess);
    let advise = &report.steps[0];
    assert_eq!(advise.status, StepStatus::Degraded);
    assert!(advise.error.as_deref().unwrap().contains("timed out"));
    assert_eq!(advise.output, json!({"programs": [], "synthetic": true}));
}

#[tokio::test]
async fn fallback_failure_aborts_the_run() {
    let registry = AgentRegistry::new();
    registry
        .register(agent("enricher", "broken", "enterprise_data_enrichment"))
        .await
        .unwrap();
    registry
        .register(agent("validator", "counting", "recommendation_validation"))
        .await
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let adapters = AdapterSet::new()
        .with("broken", Arc::new(FailingAdapter))
        .with(
            "counting",
            Arc::new(CountingAdapter {
                calls: calls.clone(),
                output: json!({}),
            }),
        );

    let pipeline = Pipeline::new("consult")
        .step(
            StepSpec::new("enrich", "enterprise_data_enrichment", "enterprise_data")
                .with_fallback(|_| Err(FallbackError("seed data missing".to_string()))),
        )
        .step(StepSpec::new("validate", "recommendation_validation", "validation"));

    let orchestrator = Orchestrator::new(registry, adapters).with_pipeline(pipeline);
    let report = orchestrator.run_pipeline("consult", json!({})).await.unwrap();

    assert_eq!(report.status, RunStatus::Failure);
    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].step, "enrich");
    assert_eq!(report.steps[0].status, StepStatus::Failed);
    assert!(report.steps[0]
        .error
        .as_deref()
        .unwrap()
        .contains("fallback generator failed at step 'enrich'"));

    // The remaining step never executed.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_pipeline_name_is_not_found() {
    let orchestrator = Orchestrator::new(AgentRegistry::new(), AdapterSet::new());
    let err = orchestrator
        .run_pipeline("no-such-flow", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn first_registered_agent_wins_capability_ties() {
    let registry = AgentRegistry::new();
    registry
        .register(agent("primary", "first_stub", "customer_processing"))
        .await
        .unwrap();
    registry
        .register(agent("standby", "second_stub", "customer_processing"))
        .await
        .unwrap();

    let adapters = AdapterSet::new()
        .with(
            "first_stub",
            Arc::new(StaticAdapter {
                output: json!("from primary"),
            }),
        )
        .with(
            "second_stub",
            Arc::new(StaticAdapter {
                output: json!("from standby"),
            }),
        );

    let pipeline = Pipeline::new("consult")
        .step(StepSpec::new("profile", "customer_processing", "customer_profile"));

    let orchestrator = Orchestrator::new(registry, adapters).with_pipeline(pipeline);
    let report = orchestrator.run_pipeline("consult", json!({})).await.unwrap();

    assert_eq!(report.steps[0].agent_id.as_deref(), Some("primary"));
    assert_eq!(report.steps[0].output, json!("from primary"));
}

#[tokio::test]
async fn repeated_runs_produce_the_same_status_sequence() {
    let registry = AgentRegistry::new();
    registry
        .register(agent("profiler", "profile_stub", "customer_processing"))
        .await
        .unwrap();
    registry
        .register(agent("enricher", "broken", "enterprise_data_enrichment"))
        .await
        .unwrap();

    let adapters = AdapterSet::new()
        .with(
            "profile_stub",
            Arc::new(StaticAdapter {
                output: json!({"segment": "residential"}),
            }),
        )
        .with("broken", Arc::new(FailingAdapter));

    let pipeline = Pipeline::new("consult")
        .step(StepSpec::new("profile", "customer_processing", "customer_profile"))
        .step(
            StepSpec::new("enrich", "enterprise_data_enrichment", "enterprise_data")
                .with_fallback(|_| Ok(json!({"synthetic": true}))),
        );

    let orchestrator = Orchestrator::new(registry, adapters).with_pipeline(pipeline);
    let input = json!({"customer_id": "12345"});

    let first = orchestrator.run_pipeline("consult", input.clone()).await.unwrap();
    let second = orchestrator.run_pipeline("consult", input).await.unwrap();

    let statuses = |report: &tandem_core::WorkflowReport| {
        report.steps.iter().map(|s| s.status).collect::<Vec<_>>()
    };
    assert_eq!(statuses(&first), statuses(&second));
    assert_eq!(first.status, second.status);
    assert_ne!(first.run_id, second.run_id);
}
