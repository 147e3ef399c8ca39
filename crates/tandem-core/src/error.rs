//! Core error type for the Tandem coordination engine.
//!
//! Adapter-level failures are a separate type (`adapter::AdapterError`) and
//! never surface here: the engine converts them into degraded steps.

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Registration input rejected synchronously (empty id or capability set).
    #[error("invalid agent descriptor: {0}")]
    InvalidDescriptor(String),

    /// Lookup by agent id or pipeline name missed.
    #[error("not found: {0}")]
    NotFound(String),

    /// A step's fallback generator failed. Fallbacks are pure and
    /// network-free, so this is a contract violation; the run stops here.
    #[error("fallback generator failed at step '{step}': {message}")]
    FallbackFailure { step: String, message: String },
}
