//! Pipeline model — fixed, ordered step sequences and the per-run context.
//!
//! A pipeline is not a general workflow graph: steps run strictly in
//! sequence, each reading a projection of the accumulated context and
//! writing its output under a merge key. Pipelines are installed by name
//! into the engine at startup and are not user-definable at runtime.

pub mod context;
pub mod spec;

pub use context::WorkflowContext;
pub use spec::{FallbackError, FallbackGenerator, InputProjection, Pipeline, StepSpec};
