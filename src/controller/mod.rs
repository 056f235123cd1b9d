//! # Controllers
//!
//! - [`reconciler`]: the Token managed-resource reconciler
//! - [`provider_config`]: keeps ProviderConfigs alive while in use
//! - [`connector`] and [`adapter`]: Token lifecycle against ArgoCD and the secret store

pub mod adapter;
pub mod backoff;
pub mod connector;
pub mod external;
pub mod finalizer;
pub mod provider_config;
pub mod reconciler;
pub mod server;
