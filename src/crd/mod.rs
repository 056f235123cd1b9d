//! # Custom Resource Definitions
//!
//! CRD types served by the ArgoCD token provider:
//! - [`Token`]: an ArgoCD account token stored in a Kubernetes secret
//! - [`ProviderConfig`]: ArgoCD server address and admin credentials
//! - [`ProviderConfigUsage`]: records which Token uses which ProviderConfig

mod managed;
mod provider_config;
pub mod registry;
mod status;
mod token;

pub use managed::Managed;
pub use provider_config::{
    CredentialsSource, ProviderConfig, ProviderConfigSpec, ProviderConfigStatus,
    ProviderConfigUsage, ProviderConfigUsageSpec, ProviderCredentials, SecretRefOverride,
    TypedReference,
};
pub use status::{
    find_condition, set_condition, Condition, CONDITION_READY, CONDITION_SYNCED,
    REASON_AVAILABLE, REASON_CREATING, REASON_DELETING, REASON_IN_USE,
    REASON_RECONCILE_ERROR, REASON_RECONCILE_SUCCESS,
};
pub use token::{
    ProviderConfigReference, SecretKeySelector, Token, TokenObservation, TokenParameters,
    TokenSpec, TokenStatus,
};
