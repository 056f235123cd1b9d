//! # Argo CD Token Provider
//!
//! A Kubernetes controller that mints Argo CD account tokens and stores them
//! in Kubernetes secrets.
//!
//! ## Overview
//!
//! 1. **Watching Tokens** - cluster-scoped `Token` resources name an Argo CD
//!    account and the secret key the token should be written to
//! 2. **Connecting** - the referenced `ProviderConfig` supplies the server
//!    address and the admin credentials secret; a session is opened per pass
//! 3. **Minting** - a missing secret value triggers `POST /api/v1/account/{name}/token`
//! 4. **Cleanup** - deleting a Token removes the stored key and releases the
//!    finalizer
//!
//! `ProviderConfig` objects are protected from deletion while
//! `ProviderConfigUsage` records still point at them.

pub mod argocd;
pub mod config;
pub mod constants;
pub mod controller;
pub mod credentials;
pub mod crd;
pub mod error;
pub mod observability;
pub mod runtime;
pub mod secret_store;

pub use error::{Error, Result};
