//! Step and pipeline definitions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::context::WorkflowContext;

/// Builds a step's request from the running context.
pub type InputProjection = Arc<dyn Fn(&WorkflowContext) -> Value + Send + Sync>;

/// Produces synthetic output for a step whose agent call failed or resolved
/// no agent. Must be pure and network-free.
pub type FallbackGenerator =
    Arc<dyn Fn(&WorkflowContext) -> Result<Value, FallbackError> + Send + Sync>;

/// Error raised by a fallback generator. Fallbacks never depend on I/O, so
/// this only occurs on a broken generator; the engine treats it as fatal.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FallbackError(pub String);

const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// One pipeline position: which capability it needs, how to build its
/// request, where its output lands, and what to synthesize when it fails.
#[derive(Clone)]
pub struct StepSpec {
    pub name: String,
    pub required_capability: String,
    pub input_projection: InputProjection,
    pub output_merge_key: String,
    pub fallback: FallbackGenerator,
    pub timeout: Duration,
}

impl StepSpec {
    /// A step that projects the full context, falls back to an empty object,
    /// and times out after 30 seconds. Override with the builder methods.
    pub fn new(
        name: impl Into<String>,
        required_capability: impl Into<String>,
        output_merge_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            required_capability: required_capability.into(),
            input_projection: Arc::new(WorkflowContext::snapshot),
            output_merge_key: output_merge_key.into(),
            fallback: Arc::new(|_| Ok(Value::Object(serde_json::Map::new()))),
            timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_input(
        mut self,
        projection: impl Fn(&WorkflowContext) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.input_projection = Arc::new(projection);
        self
    }

    pub fn with_fallback(
        mut self,
        fallback: impl Fn(&WorkflowContext) -> Result<Value, FallbackError> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepSpec")
            .field("name", &self.name)
            .field("required_capability", &self.required_capability)
            .field("output_merge_key", &self.output_merge_key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A fixed, ordered workflow, installed into the engine under its name.
#[derive(Clone, Debug)]
pub struct Pipeline {
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<StepSpec>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_projection_is_full_snapshot() {
        let step = StepSpec::new("probe", "anything", "out");
        let ctx = WorkflowContext::from_input(json!({"a": 1}));
        assert_eq!((step.input_projection)(&ctx), json!({"a": 1}));
        assert_eq!(step.timeout, Duration::from_secs(30));
        assert_eq!((step.fallback)(&ctx).unwrap(), json!({}));
    }

    #[test]
    fn builders_override_defaults() {
        let step = StepSpec::new("probe", "anything", "out")
            .with_input(|ctx| json!({"only": ctx.get("a").cloned()}))
            .with_fallback(|_| Ok(json!({"synthetic": true})))
            .with_timeout(Duration::from_millis(250));

        let ctx = WorkflowContext::from_input(json!({"a": 1, "b": 2}));
        assert_eq!((step.input_projection)(&ctx), json!({"only": 1}));
        assert_eq!((step.fallback)(&ctx).unwrap(), json!({"synthetic": true}));
        assert_eq!(step.timeout, Duration::from_millis(250));
    }

    #[test]
    fn pipeline_builder_keeps_step_order() {
        let pipeline = Pipeline::new("demo")
            .with_description("two steps")
            .step(StepSpec::new("first", "cap_a", "a"))
            .step(StepSpec::new("second", "cap_b", "b"));
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.steps[0].name, "first");
        assert_eq!(pipeline.steps[1].name, "second");
    }
}
