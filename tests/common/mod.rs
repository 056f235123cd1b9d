//! Shared fixtures for the integration tests
//!
//! Tokens and ProviderConfigs are built from JSON manifests, like the
//! objects the API server hands to the controller.

#![allow(dead_code, reason = "each test binary uses a subset of the fixtures")]

use argocd_token_provider::argocd::{MintOptions, SessionProvider, TokenMinter};
use argocd_token_provider::credentials::{CredentialResolver, Credentials};
use argocd_token_provider::crd::{ProviderConfig, SecretKeySelector, Token};
use argocd_token_provider::error::{Error, Result};
use argocd_token_provider::observability::events::RecordingEventPublisher;
use argocd_token_provider::secret_store::InMemorySecretStore;
use argocd_token_provider::controller::connector::{InMemoryProviderConfigStore, TokenConnector};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const TOKEN_UID: &str = "7c2b0a4e-5c1e-4f0a-9d8e-3f4f1b2a6c11";

pub fn token_secret() -> SecretKeySelector {
    SecretKeySelector::new("ns", "my-secret", "token")
}

pub fn admin_secret() -> SecretKeySelector {
    SecretKeySelector::new("argocd", "argocd-initial-admin-secret", "password")
}

/// A Token for account `alice` writing to `ns/my-secret#token`
pub fn token() -> Token {
    token_from(serde_json::json!({
        "providerConfigRef": { "name": "default" },
        "forProvider": {
            "account": "alice",
            "writeTokenSecretToRef": { "name": "my-secret", "namespace": "ns", "key": "token" }
        }
    }))
}

pub fn token_from(spec: serde_json::Value) -> Token {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "argocd.krateoplatformops.io/v1alpha1",
        "kind": "Token",
        "metadata": { "name": "alice-token", "uid": TOKEN_UID, "finalizers": ["finalizer.managedresource.crossplane.io"] },
        "spec": spec
    }))
    .unwrap()
}

/// Mark `token` as being deleted
pub fn deleting(mut token: Token) -> Token {
    let mut metadata = serde_json::to_value(&token.metadata).unwrap();
    metadata["deletionTimestamp"] = serde_json::json!("2024-05-01T10:00:00Z");
    token.metadata = serde_json::from_value(metadata).unwrap();
    token
}

/// Record a previously minted token on the status of `token`
pub fn created(mut token: Token) -> Token {
    token.status = Some(
        serde_json::from_value(serde_json::json!({ "atProvider": { "id": "tok-0" } })).unwrap(),
    );
    token
}

pub fn provider_config(spec: serde_json::Value) -> ProviderConfig {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "argocd.krateoplatformops.io/v1alpha1",
        "kind": "ProviderConfig",
        "metadata": { "name": "default", "uid": "0f6e2c55-2b8b-4a39-bb6f-1f0d7f0a9e01" },
        "spec": spec
    }))
    .unwrap()
}

/// Mints `token-1`, `token-2`, ... and records every request
#[derive(Debug, Default)]
pub struct FakeMinter {
    pub calls: Mutex<Vec<(String, MintOptions)>>,
    pub fail: AtomicBool,
}

impl FakeMinter {
    pub fn failing() -> Self {
        let minter = Self::default();
        minter.fail.store(true, Ordering::SeqCst);
        minter
    }

    pub fn calls(&self) -> Vec<(String, MintOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenMinter for FakeMinter {
    async fn mint_token(&self, account: &str, options: &MintOptions) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((account.to_string(), options.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::TokenMintFailed {
                account: account.to_string(),
                message: "unexpected status 500 Internal Server Error".to_string(),
                source: None,
            });
        }
        Ok(format!("token-{}", calls.len()))
    }
}

/// Hands out a shared [`FakeMinter`] and records who logged in where
#[derive(Debug, Default)]
pub struct FakeSessions {
    pub minter: Arc<FakeMinter>,
    pub logins: Mutex<Vec<(String, String, String)>>,
    pub reject: AtomicBool,
}

impl FakeSessions {
    /// `(server, username, password)` per login
    pub fn logins(&self) -> Vec<(String, String, String)> {
        self.logins.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    async fn login(&self, server_addr: &str, credentials: &Credentials) -> Result<Arc<dyn TokenMinter>> {
        self.logins.lock().unwrap().push((
            server_addr.to_string(),
            credentials.username.clone(),
            credentials.password.clone(),
        ));
        if self.reject.load(Ordering::SeqCst) {
            return Err(Error::AuthenticationFailed {
                server: server_addr.to_string(),
                message: "unexpected status 401 Unauthorized".to_string(),
                source: None,
            });
        }
        Ok(Arc::clone(&self.minter) as Arc<dyn TokenMinter>)
    }
}

/// A [`TokenConnector`] wired to in-memory collaborators
pub struct Harness {
    pub provider_configs: Arc<InMemoryProviderConfigStore>,
    pub secrets: Arc<InMemorySecretStore>,
    pub sessions: Arc<FakeSessions>,
    pub events: Arc<RecordingEventPublisher>,
    pub connector: TokenConnector,
}

impl Harness {
    /// A harness with the `default` ProviderConfig and the admin password seeded
    pub fn new() -> Self {
        let harness = Self::empty();
        harness
            .provider_configs
            .insert(provider_config(serde_json::json!({ "serverAddr": "argocd.local" })));
        harness.secrets.insert(&admin_secret(), "s3cr3t");
        harness
    }

    pub fn empty() -> Self {
        let provider_configs = Arc::new(InMemoryProviderConfigStore::new());
        let secrets = Arc::new(InMemorySecretStore::new());
        let sessions = Arc::new(FakeSessions::default());
        let events = Arc::new(RecordingEventPublisher::new());
        let connector = TokenConnector::new(
            Arc::clone(&provider_configs) as _,
            Arc::clone(&secrets) as _,
            Arc::clone(&sessions) as _,
            CredentialResolver::new("argocd"),
            Arc::clone(&events) as _,
        );
        Self {
            provider_configs,
            secrets,
            sessions,
            events,
            connector,
        }
    }
}
