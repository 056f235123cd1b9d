//! # External client contract
//!
//! The four lifecycle operations a managed resource kind implements against
//! its external system, and the connector producing a client per pass.

use crate::crd::Managed;
use crate::error::Result;
use async_trait::async_trait;

/// Result of observing the external resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    /// Always true when the resource exists, there is no drift detection
    pub resource_up_to_date: bool,
}

impl ExternalObservation {
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            resource_exists: false,
            resource_up_to_date: true,
        }
    }

    #[must_use]
    pub const fn current() -> Self {
        Self {
            resource_exists: true,
            resource_up_to_date: true,
        }
    }
}

/// What a successful Create produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalCreation {
    /// Id of the minted token
    pub token_id: Option<String>,
    /// Expiry requested for the minted token, when it expires at all
    pub expires_in: Option<i64>,
}

/// Lifecycle operations bound to one authenticated session
#[async_trait]
pub trait ExternalClient: Send + Sync {
    async fn observe(&self, mg: &Managed) -> Result<ExternalObservation>;

    async fn create(&self, mg: &Managed) -> Result<ExternalCreation>;

    async fn update(&self, mg: &Managed) -> Result<()>;

    async fn delete(&self, mg: &Managed) -> Result<()>;
}

/// Produces an [`ExternalClient`] for one reconcile pass
#[async_trait]
pub trait ExternalConnector: Send + Sync {
    async fn connect(&self, mg: &Managed) -> Result<Box<dyn ExternalClient>>;
}
