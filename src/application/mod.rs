//! Application layer: the payment lifecycle and the pieces it composes.
//!
//! [`orchestrator::PaymentOrchestrator`] is the entry point. Provider status
//! translation lives in [`status_map`] and provider selection in [`selector`],
//! so neither leaks into the adapters.

pub mod locks;
pub mod orchestrator;
pub mod results;
pub mod selector;
pub mod status_map;
