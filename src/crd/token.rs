//! # Token
//!
//! The managed resource: an ArgoCD account token written to a secret.

use super::status::Condition;
use crate::constants::DEFAULT_PROVIDER_CONFIG_NAME;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token Custom Resource Definition
///
/// Mints an access token for an ArgoCD account and stores it in a
/// Kubernetes secret.
///
/// # Example
///
/// ```yaml
/// apiVersion: argocd.krateoplatformops.io/v1alpha1
/// kind: Token
/// metadata:
///   name: alice-token
/// spec:
///   providerConfigRef:
///     name: argocd-provider-config
///   forProvider:
///     account: alice
///     writeTokenSecretToRef:
///       name: my-secret
///       namespace: ns
///       key: token
/// ```
#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "Token",
    group = "argocd.krateoplatformops.io",
    version = "v1alpha1",
    status = "TokenStatus",
    shortname = "argotoken",
    category = "argocd",
    category = "managed",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name":"AGE", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TokenSpec {
    /// ProviderConfig holding the ArgoCD server address and credentials,
    /// `default` when omitted
    #[serde(default)]
    pub provider_config_ref: ProviderConfigReference,
    /// Desired token
    pub for_provider: TokenParameters,
}

/// The configurable fields of a Token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenParameters {
    /// Account name
    pub account: String,
    /// Optional token id. Falls back to a generated UUID if not specified
    #[serde(default)]
    pub id: Option<String>,
    /// Seconds before the token expires. Absent or 0 means no expiration
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Where the minted token is written
    pub write_token_secret_to_ref: SecretKeySelector,
}

impl TokenParameters {
    /// Expiry hint passed to ArgoCD, 0 meaning never
    #[must_use]
    pub fn expires_in_seconds(&self) -> i64 {
        self.expires_in.unwrap_or(0).max(0)
    }

    /// Explicit token id, if a non-blank one was given
    #[must_use]
    pub fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Reference to a cluster-scoped ProviderConfig
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigReference {
    /// Name of the ProviderConfig
    pub name: String,
}

impl Default for ProviderConfigReference {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER_CONFIG_NAME.to_string(),
        }
    }
}

/// A single key of a namespaced secret
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Secret namespace
    pub namespace: String,
    /// Key within the secret data
    pub key: String,
}

impl SecretKeySelector {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for SecretKeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.namespace, self.name, self.key)
    }
}

/// Observed state of a Token
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    /// Ready and Synced conditions
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Fields observed at the provider
    #[serde(default)]
    pub at_provider: TokenObservation,
}

/// The observable fields of a Token
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenObservation {
    /// Id of the last minted token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Expiry requested for the last minted token (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}
