//! # Credential Resolver
//!
//! Works out which secret holds the ArgoCD administrator password and reads
//! it. The default is ArgoCD's bootstrap secret
//! `argocd-initial-admin-secret`, key `password`. A ProviderConfig may
//! override any subset of name, namespace and key; blank overrides are
//! ignored.

use crate::constants::{ARGOCD_ADMIN_USERNAME, ARGOCD_INITIAL_ADMIN_SECRET, BASIC_AUTH_PASSWORD_KEY};
use crate::crd::{CredentialsSource, ProviderConfigSpec, SecretKeySelector};
use crate::error::{Error, Result};
use crate::secret_store::SecretStore;
use std::fmt;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Administrator username and password
///
/// Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    default_namespace: String,
}

impl CredentialResolver {
    /// `default_namespace` is where the bootstrap secret is looked up when
    /// no namespace override is given
    pub fn new(default_namespace: impl Into<String>) -> Self {
        Self {
            default_namespace: default_namespace.into(),
        }
    }

    /// Secret coordinate of the admin password for `config`
    ///
    /// Fails with `UnsupportedCredentialsSource` for any source other than `Secret`.
    pub fn resolve(&self, config: &ProviderConfigSpec) -> Result<SecretKeySelector> {
        let mut selector = SecretKeySelector::new(
            self.default_namespace.clone(),
            ARGOCD_INITIAL_ADMIN_SECRET,
            BASIC_AUTH_PASSWORD_KEY,
        );

        let Some(credentials) = &config.credentials else {
            return Ok(selector);
        };

        if credentials.source != CredentialsSource::Secret {
            return Err(Error::UnsupportedCredentialsSource {
                kind: credentials.source.to_string(),
            });
        }

        if let Some(overrides) = &credentials.secret_ref {
            if let Some(name) = non_blank(overrides.name.as_deref()) {
                selector.name = name.to_string();
            }
            if let Some(namespace) = non_blank(overrides.namespace.as_deref()) {
                selector.namespace = namespace.to_string();
            }
            if let Some(key) = non_blank(overrides.key.as_deref()) {
                selector.key = key.to_string();
            }
        }

        Ok(selector)
    }

    /// Resolve and read the admin credentials
    pub async fn load(&self, store: &dyn SecretStore, config: &ProviderConfigSpec) -> Result<Credentials> {
        let selector = self.resolve(config)?;
        debug!(secret = %selector, "Reading Argo CD admin password");

        let bytes = store
            .get(&selector)
            .await
            .map_err(|source| Error::CredentialsUnavailable {
                secret: selector.to_string(),
                source,
            })?;

        let password = String::from_utf8(bytes).map_err(|_| Error::InvalidCredentials {
            secret: selector.to_string(),
        })?;

        Ok(Credentials::new(ARGOCD_ADMIN_USERNAME, password))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
