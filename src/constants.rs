//! # Constants
//!
//! Names, labels and default values shared across the controller.

/// API group of every resource served by this provider
pub const API_GROUP: &str = "argocd.krateoplatformops.io";

/// API version of every resource served by this provider
pub const API_VERSION: &str = "v1alpha1";

/// Field manager used for server-side apply and status patches
pub const FIELD_MANAGER: &str = "argocd-token-provider";

/// Controller name reported on Kubernetes Events for Tokens
pub const TOKEN_CONTROLLER_NAME: &str = "managed/token.argocd.krateoplatformops.io";

/// Controller name for the ProviderConfig usage controller
pub const PROVIDER_CONFIG_CONTROLLER_NAME: &str = "providerconfig/argocd.krateoplatformops.io";

/// ProviderConfig used by Tokens that do not name one
pub const DEFAULT_PROVIDER_CONFIG_NAME: &str = "default";

/// Finalizer guarding the stored token secret of a Token
pub const TOKEN_FINALIZER: &str = "finalizer.managedresource.crossplane.io";

/// Finalizer keeping a ProviderConfig alive while Tokens still use it
pub const PROVIDER_CONFIG_FINALIZER: &str = "in-use.argocd.krateoplatformops.io";

/// Label carried by every ProviderConfigUsage, value is the ProviderConfig name
pub const PROVIDER_CONFIG_LABEL: &str = "argocd.krateoplatformops.io/provider-config";

/// Bootstrap secret ArgoCD creates with the initial admin password
pub const ARGOCD_INITIAL_ADMIN_SECRET: &str = "argocd-initial-admin-secret";

/// Key holding the password in a basic-auth style secret
pub const BASIC_AUTH_PASSWORD_KEY: &str = "password";

/// ArgoCD built-in administrator account
pub const ARGOCD_ADMIN_USERNAME: &str = "admin";

/// Namespace ArgoCD is installed into by default
pub const DEFAULT_ARGOCD_NAMESPACE: &str = "argocd";

/// Default resync interval for healthy Tokens
pub const DEFAULT_RESYNC_INTERVAL: &str = "1m";

/// Default delay before re-observing a freshly created or deleted Token
pub const DEFAULT_CREATE_POLL_INTERVAL: &str = "10s";

/// Default requeue for configuration errors
pub const DEFAULT_CONFIG_ERROR_REQUEUE: &str = "5m";

/// Default minimum backoff for transient errors (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default maximum backoff for transient errors (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default timeout for a single ArgoCD API request (seconds)
pub const DEFAULT_ARGOCD_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Requeue while a ProviderConfig is still in use during deletion (seconds)
pub const PROVIDER_CONFIG_IN_USE_REQUEUE_SECS: u64 = 30;

/// Default HTTP server port for metrics and probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval (milliseconds)
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default user agent sent to ArgoCD
#[must_use]
pub fn default_user_agent() -> String {
    format!("argocd-token-provider/{}", env!("CARGO_PKG_VERSION"))
}
