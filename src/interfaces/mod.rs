//! Transports exposing the orchestrator to callers.

pub mod cli;
