//! Tandem Adapters — concrete agent integrations for the Tandem engine.
//!
//! Each module implements the core `AgentAdapter` contract for one call
//! style; vendor wire details (payload envelopes, double-encoded bodies,
//! poll cadence) live here and never reach the engine:
//!
//! - [`webhook`] — JSON POST to an automation-platform webhook
//! - [`direct`] — single round trip to a messages-style completion API
//! - [`polling`] — submit a job, then poll a status endpoint until terminal
//! - [`simulated`] — deterministic synthetic responder, no network
//!
//! [`consultation`] defines the built-in consultation pipelines that
//! compose these agent types into one customer-facing result.

pub mod consultation;
pub mod direct;
pub mod polling;
pub mod recommendations;
pub mod simulated;
pub mod webhook;

pub use direct::DirectApiAdapter;
pub use polling::PollingAdapter;
pub use recommendations::parse_recommendations;
pub use simulated::SimulatedAdapter;
pub use webhook::WebhookAdapter;

use std::sync::Arc;

use tandem_core::AdapterSet;

/// Adapter set covering every built-in agent type, keyed by the
/// `agent_type` tags used in agent rosters.
pub fn standard_adapters() -> AdapterSet {
    AdapterSet::new()
        .with("webhook", Arc::new(WebhookAdapter::new()))
        .with("direct_api", Arc::new(DirectApiAdapter::new()))
        .with("polling", Arc::new(PollingAdapter::new()))
        .with("simulated", Arc::new(SimulatedAdapter::new()))
}
