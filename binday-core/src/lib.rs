//! Core types and service wiring for the binday waste collection schedule fetcher.

/// Next-collection facts derived from a fetched schedule.
pub mod display;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Registry that routes municipalities to provider implementations.
pub mod plugin;
/// Traits describing the provider interface and its failure modes.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;

pub use display::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
