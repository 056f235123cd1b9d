//! # ArgoCD Session Provider
//!
//! Authenticates against an ArgoCD server and mints account tokens.
//!
//! Each reconcile pass logs in afresh: a [`SessionProvider`] turns a server
//! address and admin credentials into a [`TokenMinter`] bound to that
//! session. Nothing is cached between passes and nothing is retried here;
//! failures go back to the caller.
//!
//! The HTTP client accepts self-signed certificates. ArgoCD is reached over
//! intra-cluster traffic and ships with a self-signed certificate by default.

mod client;
mod requests;
mod responses;

pub use client::{normalize_server_addr, ArgoCdClient, ClientOptions, Session};

use crate::credentials::Credentials;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Token parameters besides the account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOptions {
    /// Token id, unique per account
    pub id: String,
    /// Seconds before expiry, 0 for never
    pub expires_in: i64,
}

/// Mints tokens within an authenticated session
#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Mint a new token for `account`. Every call creates a new token.
    async fn mint_token(&self, account: &str, options: &MintOptions) -> Result<String>;
}

/// Opens authenticated sessions
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn login(&self, server_addr: &str, credentials: &Credentials) -> Result<Arc<dyn TokenMinter>>;
}

/// [`SessionProvider`] talking to a real ArgoCD server over HTTP
#[derive(Debug, Clone)]
pub struct ArgoCdSessionProvider {
    options: ClientOptions,
}

impl ArgoCdSessionProvider {
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl SessionProvider for ArgoCdSessionProvider {
    async fn login(&self, server_addr: &str, credentials: &Credentials) -> Result<Arc<dyn TokenMinter>> {
        let client = ArgoCdClient::new(server_addr, &self.options)?;
        let session = client.login(credentials).await?;
        Ok(Arc::new(session))
    }
}
