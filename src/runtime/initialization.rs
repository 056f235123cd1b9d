//! # Initialization
//!
//! Startup: tracing, rustls, configuration, the type registry, metrics,
//! the HTTP server, the Kubernetes client and the controller wiring.

use crate::argocd::ArgoCdSessionProvider;
use crate::config::{self, ControllerConfig, ServerConfig};
use crate::constants::{PROVIDER_CONFIG_CONTROLLER_NAME, TOKEN_CONTROLLER_NAME};
use crate::controller::connector::{KubeProviderConfigStore, TokenConnector};
use crate::controller::provider_config::ProviderConfigReconciler;
use crate::controller::reconciler::TokenReconciler;
use crate::controller::server::{start_server, ServerState};
use crate::credentials::CredentialResolver;
use crate::crd;
use crate::observability;
use crate::observability::events::KubeEventPublisher;
use crate::secret_store::KubeSecretStore;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    pub token_reconciler: Arc<TokenReconciler>,
    pub provider_config_reconciler: Arc<ProviderConfigReconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("token_reconciler", &self.token_reconciler)
            .field("provider_config_reconciler", &self.provider_config_reconciler)
            .field("server_state", &self.server_state)
            .finish_non_exhaustive()
    }
}

/// Initialize the provider runtime
///
/// # Errors
///
/// Fails if metrics cannot be registered, the HTTP server does not come
/// up, or no Kubernetes client can be built.
pub async fn initialize() -> Result<InitializationResult> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "argocd_token_provider=info".into()),
        )
        .init();

    // Must happen before any TLS connection is made
    if let Err(provider) = rustls::crypto::ring::default_provider().install_default() {
        warn!(?provider, "A rustls crypto provider was already installed");
    }

    info!("Starting Argo CD token provider v{}", env!("CARGO_PKG_VERSION"));

    let (controller_config, server_config) = config::load_config();
    info!(
        resync_interval = ?controller_config.resync_interval,
        create_poll_interval = ?controller_config.create_poll_interval,
        argocd_namespace = %controller_config.argocd_namespace,
        "Loaded configuration"
    );

    let kinds = crd::registry::init();
    info!("Registered {} kinds", kinds);

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_handle = {
        let state = Arc::clone(&server_state);
        let port = server_config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!("HTTP server error: {}", e);
            }
        })
    };
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let (token_reconciler, provider_config_reconciler) = build_reconcilers(&client, controller_config);

    info!("Provider initialized, starting watch loop...");
    Ok(InitializationResult {
        client,
        token_reconciler,
        provider_config_reconciler,
        server_state,
    })
}

/// Wire the production collaborators into both reconcilers
pub fn build_reconcilers(
    client: &Client,
    config: ControllerConfig,
) -> (Arc<TokenReconciler>, Arc<ProviderConfigReconciler>) {
    let token_events = Arc::new(KubeEventPublisher::new(client.clone(), TOKEN_CONTROLLER_NAME));
    let connector = TokenConnector::new(
        Arc::new(KubeProviderConfigStore::new(client.clone())),
        Arc::new(KubeSecretStore::new(client.clone())),
        Arc::new(ArgoCdSessionProvider::new(config.client_options())),
        CredentialResolver::new(config.argocd_namespace.clone()),
        token_events.clone(),
    );
    let token_reconciler = Arc::new(TokenReconciler::new(
        client.clone(),
        Arc::new(connector),
        token_events,
        config.clone(),
    ));

    let provider_config_reconciler = Arc::new(ProviderConfigReconciler::new(
        client.clone(),
        Arc::new(KubeEventPublisher::new(client.clone(), PROVIDER_CONFIG_CONTROLLER_NAME)),
        config,
    ));

    (token_reconciler, provider_config_reconciler)
}

/// Wait for the HTTP server to bind
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = Duration::from_secs(server_config.startup_timeout_secs);
    let poll_interval = Duration::from_millis(server_config.poll_interval_ms);
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_bound.load(Ordering::Relaxed) {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
