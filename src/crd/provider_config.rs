//! # ProviderConfig
//!
//! Connection settings for an ArgoCD server, plus the usage records that
//! keep a ProviderConfig alive while Tokens reference it.

use super::status::Condition;
use super::token::ProviderConfigReference;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ProviderConfig Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: argocd.krateoplatformops.io/v1alpha1
/// kind: ProviderConfig
/// metadata:
///   name: argocd-provider-config
/// spec:
///   serverAddr: argocd-server.argocd.svc
///   credentials:
///     source: Secret
///     secretRef:
///       namespace: argocd
/// ```
#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ProviderConfig",
    group = "argocd.krateoplatformops.io",
    version = "v1alpha1",
    status = "ProviderConfigStatus",
    category = "argocd",
    category = "provider",
    printcolumn = r#"{"name":"SERVER", "type":"string", "jsonPath":".spec.serverAddr"}"#,
    printcolumn = r#"{"name":"USERS", "type":"integer", "jsonPath":".status.users"}"#,
    printcolumn = r#"{"name":"AGE", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// ArgoCD server address, with or without scheme
    pub server_addr: String,
    /// Where the administrator credentials come from
    /// Defaults to the `argocd-initial-admin-secret` bootstrap secret
    #[serde(default)]
    pub credentials: Option<ProviderCredentials>,
}

/// Credentials descriptor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    /// Source of the credentials. Only `Secret` is supported
    pub source: CredentialsSource,
    /// Overrides for the default secret reference
    #[serde(default)]
    pub secret_ref: Option<SecretRefOverride>,
}

/// Known credential sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum CredentialsSource {
    None,
    Secret,
    InjectedIdentity,
    Environment,
    Filesystem,
}

impl fmt::Display for CredentialsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::Secret => "Secret",
            Self::InjectedIdentity => "InjectedIdentity",
            Self::Environment => "Environment",
            Self::Filesystem => "Filesystem",
        };
        f.write_str(s)
    }
}

/// Partial secret reference, blank fields keep their default
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRefOverride {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Observed state of a ProviderConfig
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigStatus {
    /// Number of managed resources using this ProviderConfig
    #[serde(default)]
    pub users: i64,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// ProviderConfigUsage Custom Resource Definition
///
/// Created by the Token connector, one per Token, named after the Token UID
/// and owned by it.
#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ProviderConfigUsage",
    group = "argocd.krateoplatformops.io",
    version = "v1alpha1",
    category = "argocd",
    category = "provider",
    printcolumn = r#"{"name":"CONFIG-NAME", "type":"string", "jsonPath":".spec.providerConfigRef.name"}"#,
    printcolumn = r#"{"name":"RESOURCE-KIND", "type":"string", "jsonPath":".spec.resourceRef.kind"}"#,
    printcolumn = r#"{"name":"RESOURCE-NAME", "type":"string", "jsonPath":".spec.resourceRef.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigUsageSpec {
    /// ProviderConfig being used
    pub provider_config_ref: ProviderConfigReference,
    /// Managed resource using it
    pub resource_ref: TypedReference,
}

/// Reference to an object of any kind
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypedReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub uid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_without_credentials() {
        let spec: ProviderConfigSpec =
            serde_json::from_value(serde_json::json!({ "serverAddr": "argocd.local" })).unwrap();
        assert_eq!(spec.server_addr, "argocd.local");
        assert!(spec.credentials.is_none());
    }

    #[test]
    fn test_provider_config_with_partial_secret_ref() {
        let spec: ProviderConfigSpec = serde_json::from_value(serde_json::json!({
            "serverAddr": "https://argocd.local",
            "credentials": { "source": "Secret", "secretRef": { "key": "admin-password" } }
        }))
        .unwrap();
        let credentials = spec.credentials.unwrap();
        assert_eq!(credentials.source, CredentialsSource::Secret);
        let secret_ref = credentials.secret_ref.unwrap();
        assert_eq!(secret_ref.key.as_deref(), Some("admin-password"));
        assert!(secret_ref.name.is_none());
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let result: Result<ProviderCredentials, _> =
            serde_json::from_value(serde_json::json!({ "source": "Vault" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_source_display_matches_wire_name() {
        assert_eq!(CredentialsSource::InjectedIdentity.to_string(), "InjectedIdentity");
        assert_eq!(
            serde_json::to_value(CredentialsSource::Environment).unwrap(),
            serde_json::json!("Environment")
        );
    }
}
