//! # Controller Configuration
//!
//! Reconcile timing, backoff bounds and ArgoCD client settings.

use super::duration::parse_kubernetes_duration;
use super::env_var_or_default;
use crate::argocd::ClientOptions;
use crate::constants::{
    default_user_agent, DEFAULT_ARGOCD_NAMESPACE, DEFAULT_ARGOCD_REQUEST_TIMEOUT_SECS,
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_CONFIG_ERROR_REQUEUE,
    DEFAULT_CREATE_POLL_INTERVAL, DEFAULT_RESYNC_INTERVAL,
};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Requeue after a pass with nothing to do
    pub resync_interval: Duration,
    /// Requeue after Create or Delete, to observe the result
    pub create_poll_interval: Duration,
    /// Requeue after a configuration or programming error
    pub config_error_requeue: Duration,
    /// First delay after a transient error
    pub backoff_min: Duration,
    /// Upper bound on the transient error delay
    pub backoff_max: Duration,
    /// User agent sent to ArgoCD
    pub argocd_user_agent: String,
    /// Timeout of a single ArgoCD request
    pub argocd_request_timeout: Duration,
    /// Namespace of the default admin secret
    pub argocd_namespace: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backoff_min_secs = env_var_or_default(&lookup, "BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS).max(1);
        let backoff_max_secs =
            env_var_or_default(&lookup, "BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS).max(backoff_min_secs);

        Self {
            resync_interval: duration_or_default(&lookup, "RESYNC_INTERVAL", DEFAULT_RESYNC_INTERVAL),
            create_poll_interval: duration_or_default(
                &lookup,
                "CREATE_POLL_INTERVAL",
                DEFAULT_CREATE_POLL_INTERVAL,
            ),
            config_error_requeue: duration_or_default(
                &lookup,
                "CONFIG_ERROR_REQUEUE",
                DEFAULT_CONFIG_ERROR_REQUEUE,
            ),
            backoff_min: Duration::from_secs(backoff_min_secs),
            backoff_max: Duration::from_secs(backoff_max_secs),
            argocd_user_agent: lookup("ARGOCD_USER_AGENT")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_user_agent),
            argocd_request_timeout: Duration::from_secs(
                env_var_or_default(
                    &lookup,
                    "ARGOCD_REQUEST_TIMEOUT_SECS",
                    DEFAULT_ARGOCD_REQUEST_TIMEOUT_SECS,
                )
                .max(1),
            ),
            argocd_namespace: lookup("ARGOCD_NAMESPACE")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_ARGOCD_NAMESPACE.to_string()),
        }
    }

    /// HTTP options for the ArgoCD client
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            user_agent: self.argocd_user_agent.clone(),
            timeout: self.argocd_request_timeout,
        }
    }
}

fn duration_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Duration {
    if let Some(value) = lookup(key) {
        match parse_kubernetes_duration(&value) {
            Ok(duration) => return duration,
            Err(e) => warn!(key, value = %value, error = %e, "Ignoring invalid duration, using default {default}"),
        }
    }
    parse_kubernetes_duration(default).unwrap_or(Duration::from_secs(60))
}
