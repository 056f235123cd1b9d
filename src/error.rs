//! # Errors
//!
//! Error type shared by the credential resolver, the ArgoCD session
//! provider, the token adapter and the reconcilers.
//!
//! Every variant classifies itself so the error policy can decide between a
//! fast exponential retry and a slow requeue waiting for a configuration fix.

use crate::secret_store::SecretStoreError;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// How the scheduler should treat a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Needs a change to a resource or ProviderConfig before it can succeed
    Configuration,
    /// Retry with backoff
    Transient,
    /// Wiring bug, never expected at runtime
    Programming,
}

impl ErrorClass {
    /// Label value used in metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transient => "transient",
            Self::Programming => "programming",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unspecified server address for Argo CD")]
    MissingServerAddress,

    #[error("invalid Argo CD server address {address}: {message}")]
    InvalidServerAddress { address: String, message: String },

    #[error("credentials source {kind} is not currently supported")]
    UnsupportedCredentialsSource { kind: String },

    #[error("providerConfigRef is not given")]
    MissingProviderConfigRef,

    #[error("referenced ProviderConfig {name} does not exist")]
    ProviderConfigNotFound { name: String },

    #[error("cannot track ProviderConfig usage: {message}")]
    UsageTrackingFailed { message: String },

    #[error("cannot read Argo CD credentials from secret {secret}")]
    CredentialsUnavailable {
        secret: String,
        #[source]
        source: SecretStoreError,
    },

    #[error("Argo CD credentials in secret {secret} are not valid UTF-8")]
    InvalidCredentials { secret: String },

    #[error("cannot build Argo CD HTTP client: {message}")]
    HttpClient { message: String },

    #[error("authentication against Argo CD at {server} failed: {message}")]
    AuthenticationFailed {
        server: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("cannot mint token for account {account}: {message}")]
    TokenMintFailed {
        account: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("token account must not be empty")]
    EmptyAccount,

    #[error("writeTokenSecretToRef {secret} must name a namespace")]
    MissingSecretNamespace { secret: String },

    #[error("cannot observe token secret {secret}")]
    ObservationFailed {
        secret: String,
        #[source]
        source: SecretStoreError,
    },

    #[error("cannot save token to secret {secret}")]
    SecretWriteFailed {
        secret: String,
        #[source]
        source: SecretStoreError,
    },

    #[error("cannot delete token secret {secret}")]
    SecretDeleteFailed {
        secret: String,
        #[source]
        source: SecretStoreError,
    },

    #[error("managed resource is not an argocd token custom resource (got {kind})")]
    WrongResourceKind { kind: String },

    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error for retry decisions
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingServerAddress
            | Self::InvalidServerAddress { .. }
            | Self::UnsupportedCredentialsSource { .. }
            | Self::MissingProviderConfigRef
            | Self::ProviderConfigNotFound { .. }
            | Self::InvalidCredentials { .. }
            | Self::HttpClient { .. }
            | Self::EmptyAccount
            | Self::MissingSecretNamespace { .. } => ErrorClass::Configuration,
            Self::UsageTrackingFailed { .. }
            | Self::CredentialsUnavailable { .. }
            | Self::AuthenticationFailed { .. }
            | Self::TokenMintFailed { .. }
            | Self::ObservationFailed { .. }
            | Self::SecretWriteFailed { .. }
            | Self::SecretDeleteFailed { .. }
            | Self::Kube(_) => ErrorClass::Transient,
            Self::WrongResourceKind { .. } | Self::Serialization(_) => ErrorClass::Programming,
        }
    }

    /// Whether the scheduler should retry quickly
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.class(), ErrorClass::Transient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_not_transient() {
        let errors = [
            Error::MissingServerAddress,
            Error::UnsupportedCredentialsSource {
                kind: "Environment".to_string(),
            },
            Error::MissingProviderConfigRef,
            Error::ProviderConfigNotFound {
                name: "default".to_string(),
            },
        ];
        for error in errors {
            assert_eq!(error.class(), ErrorClass::Configuration, "{error}");
            assert!(!error.is_transient());
        }
    }

    #[test]
    fn test_runtime_failures_are_transient() {
        let auth = Error::AuthenticationFailed {
            server: "argocd.local".to_string(),
            message: "401 Unauthorized".to_string(),
            source: None,
        };
        let mint = Error::TokenMintFailed {
            account: "alice".to_string(),
            message: "500".to_string(),
            source: None,
        };
        assert!(auth.is_transient());
        assert!(mint.is_transient());
    }

    #[test]
    fn test_wrong_kind_is_programming_error() {
        let error = Error::WrongResourceKind {
            kind: "ProviderConfig".to_string(),
        };
        assert_eq!(error.class(), ErrorClass::Programming);
        assert_eq!(error.class().as_str(), "programming");
    }

    #[test]
    fn test_unsupported_source_message() {
        let error = Error::UnsupportedCredentialsSource {
            kind: "InjectedIdentity".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "credentials source InjectedIdentity is not currently supported"
        );
    }
}
