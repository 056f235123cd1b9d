//! # Secret Store
//!
//! Key-value access to Kubernetes secrets, addressed by
//! `(namespace, name, key)` through a [`SecretKeySelector`].
//!
//! - [`KubeSecretStore`]: backed by the Kubernetes API
//! - [`InMemorySecretStore`]: process-local map, used by tests

mod kubernetes;
mod memory;

pub use self::kubernetes::KubeSecretStore;
pub use self::memory::{InMemorySecretStore, Operation};

use crate::crd::SecretKeySelector;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret {secret} not found")]
    NotFound { secret: String },

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("secret reference {secret} has no namespace")]
    MissingNamespace { secret: String },

    #[error("secret store backend error: {message}")]
    Backend { message: String },
}

impl SecretStoreError {
    pub(crate) fn not_found(selector: &SecretKeySelector) -> Self {
        Self::NotFound {
            secret: selector.to_string(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Reject selectors that do not name a namespace
pub(crate) fn require_namespace(selector: &SecretKeySelector) -> Result<&str, SecretStoreError> {
    let namespace = selector.namespace.trim();
    if namespace.is_empty() {
        return Err(SecretStoreError::MissingNamespace {
            secret: selector.to_string(),
        });
    }
    Ok(namespace)
}

/// Opaque key-value backend for secret entries
///
/// `get` fails with [`SecretStoreError::NotFound`] when either the secret or
/// the key is missing. `delete` on a missing entry succeeds.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, selector: &SecretKeySelector) -> Result<Vec<u8>, SecretStoreError>;

    async fn set(&self, selector: &SecretKeySelector, value: &[u8]) -> Result<(), SecretStoreError>;

    async fn delete(&self, selector: &SecretKeySelector) -> Result<(), SecretStoreError>;
}
