//! # Token Reconciler
//!
//! Drives a Token through Connect, Observe and Create or Delete, reports
//! the result as Ready and Synced conditions, and manages the finalizer
//! guarding the token secret. The finalizer is added once Observe succeeds.
//!
//! Collaborators are injected through [`TokenReconciler::new`]. Retry
//! timing for failed passes lives in the error policy; a successful pass
//! resets it.

mod pass;
mod status;

pub use pass::{actuate, connect_and_observe, plan, run_pass, Observed, PassOutcome, Requeue, Step};
pub use status::{next_status, update_status};

use crate::config::ControllerConfig;
use crate::constants::TOKEN_FINALIZER;
use crate::controller::backoff::BackoffRegistry;
use crate::controller::external::ExternalConnector;
use crate::controller::finalizer::{add_finalizer, has_finalizer, remove_finalizer};
use crate::crd::Token;
use crate::error::Error;
use crate::observability::events::EventPublisher;
use crate::observability::metrics;
use kube::runtime::controller::Action;
use kube::{Api, Client, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, Instrument};

/// Shared state of the Token controller
pub struct TokenReconciler {
    client: Client,
    connector: Arc<dyn ExternalConnector>,
    events: Arc<dyn EventPublisher>,
    config: ControllerConfig,
    backoff: BackoffRegistry,
}

impl std::fmt::Debug for TokenReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenReconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenReconciler {
    pub fn new(
        client: Client,
        connector: Arc<dyn ExternalConnector>,
        events: Arc<dyn EventPublisher>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            client,
            connector,
            events,
            backoff: BackoffRegistry::new(config.backoff_min, config.backoff_max),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Per-Token retry state used by the error policy
    #[must_use]
    pub fn backoff(&self) -> &BackoffRegistry {
        &self.backoff
    }

    fn api(&self) -> Api<Token> {
        Api::all(self.client.clone())
    }
}

/// Reconcile one Token
///
/// # Errors
///
/// Returns the pass error so the error policy can schedule the retry.
pub async fn reconcile(token: Arc<Token>, ctx: Arc<TokenReconciler>) -> Result<Action, Error> {
    let name = token.name_any();
    let span = tracing::info_span!("reconcile", token = %name, kind = "Token");
    reconcile_token(token, ctx).instrument(span).await
}

async fn reconcile_token(token: Arc<Token>, ctx: Arc<TokenReconciler>) -> Result<Action, Error> {
    let name = token.name_any();
    let started = Instant::now();
    metrics::increment_reconciliations("Token");

    let api = ctx.api();
    let deleting = token.meta().deletion_timestamp.is_some();

    if deleting && !has_finalizer(token.as_ref(), TOKEN_FINALIZER) {
        debug!("Token is being deleted and holds no finalizer, nothing to do");
        return Ok(Action::await_change());
    }

    let outcome =
        match connect_and_observe(Arc::clone(&token), ctx.connector.as_ref(), ctx.events.as_ref()).await {
            Ok(observed) => {
                // Only a Token that reached Argo CD can leave a minted token behind
                if !deleting && add_finalizer(&api, token.as_ref(), TOKEN_FINALIZER).await? {
                    debug!("Added finalizer");
                }
                actuate(&token, observed, ctx.events.as_ref()).await
            }
            Err(outcome) => outcome,
        };
    metrics::observe_reconciliation_duration(started.elapsed().as_secs_f64());

    if outcome.remove_finalizer {
        remove_finalizer(&api, token.as_ref(), TOKEN_FINALIZER).await?;
        info!("Token finalized");
        ctx.backoff.reset(&name);
        return Ok(Action::await_change());
    }

    update_status(&api, &token, &outcome).await?;

    if let Some(error) = outcome.error {
        return Err(error);
    }

    ctx.backoff.reset(&name);
    let (delay, reason) = match outcome.requeue {
        Requeue::Poll => (ctx.config.create_poll_interval, "poll"),
        Requeue::Resync => (ctx.config.resync_interval, "resync"),
    };
    debug!(step = ?outcome.step, requeue_after = ?delay, "Reconcile pass complete");
    metrics::increment_requeues_total(reason);
    Ok(Action::requeue(delay))
}
