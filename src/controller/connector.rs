//! # Token connector
//!
//! Connect step of a reconcile pass: find the ProviderConfig, record the
//! usage, read the admin password and log in to ArgoCD. Every pass logs in
//! afresh and the session is dropped with the returned client.

use super::adapter::TokenExternal;
use super::external::{ExternalClient, ExternalConnector};
use crate::argocd::SessionProvider;
use crate::constants::{FIELD_MANAGER, PROVIDER_CONFIG_LABEL};
use crate::credentials::CredentialResolver;
use crate::crd::{
    Managed, ProviderConfig, ProviderConfigUsage, ProviderConfigUsageSpec, Token, TypedReference,
};
use crate::error::{Error, Result};
use crate::observability::events::{actions, reasons, EventPublisher};
use crate::secret_store::SecretStore;
use async_trait::async_trait;
use kube::api::{Patch, PatchParams};
use kube::runtime::events::EventType;
use kube::{Api, Client, Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Access to ProviderConfigs and their usage records
#[async_trait]
pub trait ProviderConfigStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<ProviderConfig>>;

    /// Record that `token` uses `provider_config`
    async fn track_usage(&self, provider_config: &ProviderConfig, token: &Token) -> Result<()>;
}

/// Build the usage record of `token`, named after its UID
pub fn usage_for(provider_config: &ProviderConfig, token: &Token) -> Result<ProviderConfigUsage> {
    let uid = token.uid().ok_or_else(|| Error::UsageTrackingFailed {
        message: format!("Token {} has no uid", token.name_any()),
    })?;
    let provider_config_name = provider_config.name_any();

    let mut usage = ProviderConfigUsage::new(
        &uid,
        ProviderConfigUsageSpec {
            provider_config_ref: crate::crd::ProviderConfigReference {
                name: provider_config_name.clone(),
            },
            resource_ref: TypedReference {
                api_version: Token::api_version(&()).into_owned(),
                kind: Token::kind(&()).into_owned(),
                name: token.name_any(),
                uid: Some(uid.clone()),
            },
        },
    );
    usage.metadata.labels = Some(BTreeMap::from([(
        PROVIDER_CONFIG_LABEL.to_string(),
        provider_config_name,
    )]));
    usage.metadata.owner_references = token.controller_owner_ref(&()).map(|owner| vec![owner]);
    Ok(usage)
}

/// [`ProviderConfigStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeProviderConfigStore {
    client: Client,
}

impl std::fmt::Debug for KubeProviderConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeProviderConfigStore").finish_non_exhaustive()
    }
}

impl KubeProviderConfigStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderConfigStore for KubeProviderConfigStore {
    async fn get(&self, name: &str) -> Result<Option<ProviderConfig>> {
        let api: Api<ProviderConfig> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    async fn track_usage(&self, provider_config: &ProviderConfig, token: &Token) -> Result<()> {
        let usage = usage_for(provider_config, token)?;
        let name = usage.name_any();
        let api: Api<ProviderConfigUsage> = Api::all(self.client.clone());
        api.patch(
            &name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&usage),
        )
        .await
        .map_err(|e| Error::UsageTrackingFailed {
            message: e.to_string(),
        })?;
        debug!(usage = %name, provider_config = %provider_config.name_any(), "Tracked ProviderConfig usage");
        Ok(())
    }
}

/// Process-local [`ProviderConfigStore`], for tests
#[derive(Debug, Default)]
pub struct InMemoryProviderConfigStore {
    configs: Mutex<BTreeMap<String, ProviderConfig>>,
    usages: Mutex<BTreeMap<String, ProviderConfigUsage>>,
}

impl InMemoryProviderConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, provider_config: ProviderConfig) {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider_config.name_any(), provider_config);
    }

    /// Recorded usages, keyed by name
    #[must_use]
    pub fn usages(&self) -> BTreeMap<String, ProviderConfigUsage> {
        self.usages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ProviderConfigStore for InMemoryProviderConfigStore {
    async fn get(&self, name: &str) -> Result<Option<ProviderConfig>> {
        Ok(self
            .configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned())
    }

    async fn track_usage(&self, provider_config: &ProviderConfig, token: &Token) -> Result<()> {
        let usage = usage_for(provider_config, token)?;
        self.usages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(usage.name_any(), usage);
        Ok(())
    }
}

/// [`ExternalConnector`] for Tokens
pub struct TokenConnector {
    provider_configs: Arc<dyn ProviderConfigStore>,
    secrets: Arc<dyn SecretStore>,
    sessions: Arc<dyn SessionProvider>,
    resolver: CredentialResolver,
    events: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for TokenConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConnector")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl TokenConnector {
    pub fn new(
        provider_configs: Arc<dyn ProviderConfigStore>,
        secrets: Arc<dyn SecretStore>,
        sessions: Arc<dyn SessionProvider>,
        resolver: CredentialResolver,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            provider_configs,
            secrets,
            sessions,
            resolver,
            events,
        }
    }
}

#[async_trait]
impl ExternalConnector for TokenConnector {
    async fn connect(&self, mg: &Managed) -> Result<Box<dyn ExternalClient>> {
        let token = mg.as_token()?;
        let config_name = token.spec.provider_config_ref.name.trim();
        if config_name.is_empty() {
            return Err(Error::MissingProviderConfigRef);
        }

        let provider_config = self
            .provider_configs
            .get(config_name)
            .await?
            .ok_or_else(|| Error::ProviderConfigNotFound {
                name: config_name.to_string(),
            })?;

        self.provider_configs
            .track_usage(&provider_config, token)
            .await?;

        let credentials = self
            .resolver
            .load(self.secrets.as_ref(), &provider_config.spec)
            .await?;
        let minter = self
            .sessions
            .login(&provider_config.spec.server_addr, &credentials)
            .await?;
        drop(credentials);

        let account = token.spec.for_provider.account.as_str();
        let secret = &token.spec.for_provider.write_token_secret_to_ref;
        info!(
            token = %token.name_any(),
            account = %account,
            secret = %secret,
            provider_config = %config_name,
            server = %provider_config.spec.server_addr,
            "Session established"
        );
        self.events
            .publish(
                &token.object_ref(&()),
                EventType::Normal,
                reasons::SESSION_ESTABLISHED,
                actions::CONNECT,
                Some(format!(
                    "Logged in to Argo CD at {} for account {account}, token secret {secret}",
                    provider_config.spec.server_addr
                )),
            )
            .await;

        Ok(Box::new(TokenExternal::new(
            minter,
            Arc::clone(&self.secrets),
            Arc::clone(&self.events),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ProviderConfigReference, ProviderConfigSpec, SecretKeySelector, TokenParameters, TokenSpec};

    fn token(uid: Option<&str>) -> Token {
        let mut token = Token::new(
            "alice-token",
            TokenSpec {
                provider_config_ref: ProviderConfigReference {
                    name: "default".to_string(),
                },
                for_provider: TokenParameters {
                    account: "alice".to_string(),
                    id: None,
                    expires_in: None,
                    write_token_secret_to_ref: SecretKeySelector::new("ns", "my-secret", "token"),
                },
            },
        );
        token.metadata.uid = uid.map(str::to_string);
        token
    }

    fn provider_config() -> ProviderConfig {
        ProviderConfig::new(
            "default",
            ProviderConfigSpec {
                server_addr: "argocd.local".to_string(),
                credentials: None,
            },
        )
    }

    #[test]
    fn test_usage_is_named_after_uid_and_owned_by_token() {
        let usage = usage_for(&provider_config(), &token(Some("1234"))).unwrap();
        assert_eq!(usage.name_any(), "1234");
        assert_eq!(
            usage.labels().get(PROVIDER_CONFIG_LABEL).map(String::as_str),
            Some("default")
        );
        assert_eq!(usage.spec.resource_ref.kind, "Token");
        assert_eq!(usage.spec.resource_ref.api_version, "argocd.krateoplatformops.io/v1alpha1");
        let owners = usage.owner_references();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].uid, "1234");
        assert_eq!(owners[0].name, "alice-token");
    }

    #[test]
    fn test_usage_requires_uid() {
        let err = usage_for(&provider_config(), &token(None)).unwrap_err();
        assert!(matches!(err, Error::UsageTrackingFailed { .. }));
    }
}
