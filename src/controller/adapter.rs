//! # Token adapter
//!
//! Maps a Token to ArgoCD and the secret store:
//! - observe: the token secret exists and is non-empty
//! - create: mint a token, then write it to the secret
//! - update: nothing, ArgoCD tokens cannot be changed in place
//! - delete: remove the secret. The token stays valid in ArgoCD.

use super::external::{ExternalClient, ExternalCreation, ExternalObservation};
use crate::argocd::{MintOptions, TokenMinter};
use crate::crd::{Managed, SecretKeySelector, Token};
use crate::error::{Error, Result};
use crate::observability::events::{actions, reasons, EventPublisher};
use crate::observability::metrics;
use crate::secret_store::SecretStore;
use async_trait::async_trait;
use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TokenExternal {
    minter: Arc<dyn TokenMinter>,
    secrets: Arc<dyn SecretStore>,
    events: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for TokenExternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExternal").finish_non_exhaustive()
    }
}

impl TokenExternal {
    pub fn new(
        minter: Arc<dyn TokenMinter>,
        secrets: Arc<dyn SecretStore>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            minter,
            secrets,
            events,
        }
    }

    /// Where the token is stored. A blank namespace is rejected rather than defaulted.
    fn secret_ref(token: &Token) -> Result<&SecretKeySelector> {
        let selector = &token.spec.for_provider.write_token_secret_to_ref;
        if selector.namespace.trim().is_empty() {
            return Err(Error::MissingSecretNamespace {
                secret: selector.to_string(),
            });
        }
        Ok(selector)
    }

    async fn normal_event(&self, token: &Token, reason: &str, action: &str, note: String) {
        self.events
            .publish(&token.object_ref(&()), EventType::Normal, reason, action, Some(note))
            .await;
    }
}

#[async_trait]
impl ExternalClient for TokenExternal {
    async fn observe(&self, mg: &Managed) -> Result<ExternalObservation> {
        let token = mg.as_token()?;
        let selector = Self::secret_ref(token)?;

        match self.secrets.get(selector).await {
            Ok(value) if value.is_empty() => {
                debug!(token = %token.name_any(), secret = %selector, "Token secret is empty");
                Ok(ExternalObservation::absent())
            }
            Ok(_) => Ok(ExternalObservation::current()),
            Err(e) if e.is_not_found() => {
                debug!(token = %token.name_any(), secret = %selector, "Token secret not found");
                Ok(ExternalObservation::absent())
            }
            Err(source) => Err(Error::ObservationFailed {
                secret: selector.to_string(),
                source,
            }),
        }
    }

    async fn create(&self, mg: &Managed) -> Result<ExternalCreation> {
        let token = mg.as_token()?;
        let params = &token.spec.for_provider;
        let account = params.account.trim();
        if account.is_empty() {
            return Err(Error::EmptyAccount);
        }

        let selector = Self::secret_ref(token)?;
        let options = MintOptions {
            id: params
                .explicit_id()
                .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string),
            expires_in: params.expires_in_seconds(),
        };

        let value = self.minter.mint_token(account, &options).await?;
        info!(account = %account, secret = %selector, token_id = %options.id, "Token minted");
        metrics::increment_tokens_minted();
        self.normal_event(
            token,
            reasons::TOKEN_MINTED,
            actions::CREATE,
            format!(
                "Minted token {} for account {account}, to be stored in secret {selector}",
                options.id
            ),
        )
        .await;

        self.secrets
            .set(selector, value.as_bytes())
            .await
            .map_err(|source| Error::SecretWriteFailed {
                secret: selector.to_string(),
                source,
            })?;
        info!(account = %account, secret = %selector, "Token saved");
        metrics::increment_secrets_saved();
        self.normal_event(
            token,
            reasons::SECRET_SAVED,
            actions::CREATE,
            format!("Saved token for account {account} to secret {selector}"),
        )
        .await;

        Ok(ExternalCreation {
            expires_in: (options.expires_in > 0).then_some(options.expires_in),
            token_id: Some(options.id),
        })
    }

    async fn update(&self, mg: &Managed) -> Result<()> {
        let token = mg.as_token()?;
        debug!(token = %token.name_any(), "Tokens are never updated in place");
        Ok(())
    }

    async fn delete(&self, mg: &Managed) -> Result<()> {
        let token = mg.as_token()?;
        let account = token.spec.for_provider.account.as_str();
        let selector = Self::secret_ref(token)?;

        match self.secrets.delete(selector).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(source) => {
                return Err(Error::SecretDeleteFailed {
                    secret: selector.to_string(),
                    source,
                })
            }
        }

        info!(account = %account, secret = %selector, "Token secret deleted");
        metrics::increment_secrets_deleted();
        self.normal_event(
            token,
            reasons::SECRET_DELETED,
            actions::DELETE,
            format!("Deleted token secret {selector} of account {account}"),
        )
        .await;
        Ok(())
    }
}
