//! # Observability
//!
//! Kubernetes Events and Prometheus metrics.

pub mod events;
pub mod metrics;
