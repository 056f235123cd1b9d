//! # Metrics Module
//!
//! Prometheus metrics for monitoring the provider.
//!
//! - `registry`: registry setup, registration and text encoding
//! - `controller_metrics`: reconciliations, tokens, secrets and requeues

pub mod controller_metrics;
pub mod registry;

pub use controller_metrics::*;
pub use registry::*;
