//! # Error Policy
//!
//! Retry timing for failed reconcile passes.
//!
//! Transient errors back off exponentially per resource, from
//! `BACKOFF_MIN_SECS` doubling up to `BACKOFF_MAX_SECS`. Configuration and
//! programming errors cannot heal by retrying, so they wait
//! `CONFIG_ERROR_REQUEUE` for someone to fix the resource.

use crate::config::ControllerConfig;
use crate::controller::backoff::BackoffRegistry;
use crate::controller::provider_config::ProviderConfigReconciler;
use crate::controller::reconciler::TokenReconciler;
use crate::crd::{ProviderConfig, Token};
use crate::error::{Error, ErrorClass};
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Delay before retrying `name` after `error`
pub fn retry_delay(
    name: &str,
    error: &Error,
    backoff: &BackoffRegistry,
    config: &ControllerConfig,
) -> Duration {
    match error.class() {
        ErrorClass::Transient => {
            let (delay, attempts) = backoff.next_backoff(name);
            warn!(
                resource.name = name,
                error = %error,
                attempts,
                retry_in_secs = delay.as_secs(),
                "Transient reconcile error, retrying with backoff"
            );
            delay
        }
        class @ (ErrorClass::Configuration | ErrorClass::Programming) => {
            error!(
                resource.name = name,
                error = %error,
                class = class.as_str(),
                retry_in_secs = config.config_error_requeue.as_secs(),
                "Reconcile error needs a configuration change"
            );
            config.config_error_requeue
        }
    }
}

fn requeue_after_error(kind: &str, name: &str, error: &Error, backoff: &BackoffRegistry, config: &ControllerConfig) -> Action {
    let class = error.class();
    metrics::increment_reconciliation_errors(kind, class.as_str());
    let delay = retry_delay(name, error, backoff, config);
    metrics::increment_requeues_total(if class == ErrorClass::Transient {
        "error-backoff"
    } else {
        "config-error"
    });
    Action::requeue(delay)
}

/// `error_policy` of the Token controller
pub fn handle_token_error(token: Arc<Token>, error: &Error, ctx: Arc<TokenReconciler>) -> Action {
    requeue_after_error("Token", &token.name_any(), error, ctx.backoff(), ctx.config())
}

/// `error_policy` of the ProviderConfig controller
pub fn handle_provider_config_error(
    provider_config: Arc<ProviderConfig>,
    error: &Error,
    ctx: Arc<ProviderConfigReconciler>,
) -> Action {
    requeue_after_error(
        "ProviderConfig",
        &provider_config.name_any(),
        error,
        ctx.backoff(),
        ctx.config(),
    )
}
