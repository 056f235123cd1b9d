//! # Watch Loop
//!
//! Runs the Token and ProviderConfig controllers until SIGTERM or Ctrl-C.
//!
//! kube-runtime guarantees at most one reconcile in flight per object.
//! Shutdown cancels in-flight passes by dropping their futures, so I/O is
//! abandoned at the next await point.

use super::error_policy::{handle_provider_config_error, handle_token_error};
use crate::controller::provider_config::{self, ProviderConfigReconciler};
use crate::controller::reconciler::{self, TokenReconciler};
use crate::controller::server::ServerState;
use crate::crd::{ProviderConfig, ProviderConfigUsage, Token};
use anyhow::Result;
use futures::StreamExt;
use kube::runtime::controller::Controller;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher;
use kube::{Api, Client};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

fn log_result<T: std::fmt::Debug, E: Display>(kind: &str, result: Result<T, E>) {
    match result {
        Ok(obj) => debug!(kind, object = ?obj, "Reconciled"),
        Err(e) => warn!(kind, error = %e, "Controller stream error"),
    }
}

/// Run both controllers until a shutdown signal arrives
///
/// # Errors
///
/// Never fails once the controllers have started; the result type leaves
/// room for startup checks.
pub async fn run_watch_loop(
    client: Client,
    token_reconciler: Arc<TokenReconciler>,
    provider_config_reconciler: Arc<ProviderConfigReconciler>,
    server_state: Arc<ServerState>,
) -> Result<()> {
    let tokens: Api<Token> = Api::all(client.clone());
    let provider_configs: Api<ProviderConfig> = Api::all(client.clone());
    let usages: Api<ProviderConfigUsage> = Api::all(client);

    let token_controller = Controller::new(tokens, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconciler::reconcile, handle_token_error, token_reconciler)
        .for_each(|result| async move { log_result("Token", result) });

    let provider_config_controller = Controller::new(provider_configs, watcher::Config::default())
        .watches(usages, watcher::Config::default(), |usage: ProviderConfigUsage| {
            Some(ObjectRef::<ProviderConfig>::new(
                &usage.spec.provider_config_ref.name,
            ))
        })
        .shutdown_on_signal()
        .run(
            provider_config::reconcile,
            handle_provider_config_error,
            provider_config_reconciler,
        )
        .for_each(|result| async move { log_result("ProviderConfig", result) });

    server_state.mark_ready();
    info!("Controllers started, watching Tokens and ProviderConfigs");

    tokio::join!(token_controller, provider_config_controller);

    info!("Controllers stopped");
    Ok(())
}
