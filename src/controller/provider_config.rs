//! # ProviderConfig Reconciler
//!
//! Counts the ProviderConfigUsages pointing at each ProviderConfig, writes
//! the count to `status.users` and holds the `in-use` finalizer so a
//! ProviderConfig cannot disappear while Tokens still rely on it.

use crate::config::ControllerConfig;
use crate::constants::{FIELD_MANAGER, PROVIDER_CONFIG_FINALIZER, PROVIDER_CONFIG_IN_USE_REQUEUE_SECS, PROVIDER_CONFIG_LABEL};
use crate::controller::backoff::BackoffRegistry;
use crate::controller::finalizer::{add_finalizer, has_finalizer, remove_finalizer};
use crate::crd::{set_condition, Condition, ProviderConfig, ProviderConfigStatus, ProviderConfigUsage, CONDITION_READY};
use crate::error::Error;
use crate::observability::events::{actions, reasons, EventPublisher};
use crate::observability::metrics;
use kube::api::{ListParams, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Api, Client, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Instrument};

/// What to do with a ProviderConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderConfigStep {
    EnsureFinalizer,
    /// Deleting, but Tokens still use it
    HoldForUsers,
    /// Deleting and unused
    Release,
    Idle,
}

#[must_use]
pub const fn plan_provider_config(deleting: bool, has_finalizer: bool, users: i64) -> ProviderConfigStep {
    match (deleting, has_finalizer) {
        (false, false) => ProviderConfigStep::EnsureFinalizer,
        (true, true) if users > 0 => ProviderConfigStep::HoldForUsers,
        (true, true) => ProviderConfigStep::Release,
        (false, true) | (true, false) => ProviderConfigStep::Idle,
    }
}

/// Status after recording `users`, or `None` when unchanged
#[must_use]
pub fn next_provider_config_status(
    current: Option<&ProviderConfigStatus>,
    users: i64,
    in_use: bool,
) -> Option<ProviderConfigStatus> {
    let mut status = current.cloned().unwrap_or_default();
    let mut changed = current.is_none() || status.users != users;
    status.users = users;
    if in_use {
        changed |= set_condition(&mut status.conditions, Condition::in_use(users));
    }
    changed.then_some(status)
}

/// Shared state of the ProviderConfig controller
pub struct ProviderConfigReconciler {
    client: Client,
    events: Arc<dyn EventPublisher>,
    config: ControllerConfig,
    backoff: BackoffRegistry,
}

impl std::fmt::Debug for ProviderConfigReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfigReconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProviderConfigReconciler {
    pub fn new(client: Client, events: Arc<dyn EventPublisher>, config: ControllerConfig) -> Self {
        Self {
            client,
            events,
            backoff: BackoffRegistry::new(config.backoff_min, config.backoff_max),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub fn backoff(&self) -> &BackoffRegistry {
        &self.backoff
    }

    async fn count_users(&self, name: &str) -> Result<i64, Error> {
        let usages: Api<ProviderConfigUsage> = Api::all(self.client.clone());
        let list = usages
            .list(&ListParams::default().labels(&format!("{PROVIDER_CONFIG_LABEL}={name}")))
            .await?;
        Ok(i64::try_from(list.items.len()).unwrap_or(i64::MAX))
    }
}

/// Reconcile one ProviderConfig
///
/// # Errors
///
/// Kubernetes API failures, retried by the error policy.
pub async fn reconcile(
    provider_config: Arc<ProviderConfig>,
    ctx: Arc<ProviderConfigReconciler>,
) -> Result<Action, Error> {
    let span = tracing::info_span!("reconcile", provider_config = %provider_config.name_any(), kind = "ProviderConfig");
    reconcile_provider_config(provider_config, ctx).instrument(span).await
}

async fn reconcile_provider_config(
    provider_config: Arc<ProviderConfig>,
    ctx: Arc<ProviderConfigReconciler>,
) -> Result<Action, Error> {
    let name = provider_config.name_any();
    metrics::increment_reconciliations("ProviderConfig");

    let api: Api<ProviderConfig> = Api::all(ctx.client.clone());
    let users = ctx.count_users(&name).await?;
    metrics::set_provider_config_users(&name, users);

    let deleting = provider_config.meta().deletion_timestamp.is_some();
    let step = plan_provider_config(
        deleting,
        has_finalizer(provider_config.as_ref(), PROVIDER_CONFIG_FINALIZER),
        users,
    );
    debug!(users, ?step, "Planned ProviderConfig step");

    if step == ProviderConfigStep::Release {
        remove_finalizer(&api, provider_config.as_ref(), PROVIDER_CONFIG_FINALIZER).await?;
        info!("ProviderConfig released");
        ctx.backoff.reset(&name);
        return Ok(Action::await_change());
    }

    if step == ProviderConfigStep::EnsureFinalizer {
        add_finalizer(&api, provider_config.as_ref(), PROVIDER_CONFIG_FINALIZER).await?;
    }

    let in_use = step == ProviderConfigStep::HoldForUsers;
    if let Some(status) = next_provider_config_status(provider_config.status.as_ref(), users, in_use) {
        let patch = serde_json::json!({ "status": status });
        api.patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
    }

    ctx.backoff.reset(&name);
    if in_use {
        info!(users, "ProviderConfig deletion blocked while in use");
        ctx.events
            .publish(
                &provider_config.object_ref(&()),
                EventType::Warning,
                reasons::IN_USE,
                actions::DELETE,
                Some(format!("ProviderConfig is still used by {users} resource(s)")),
            )
            .await;
        metrics::increment_requeues_total("in-use");
        return Ok(Action::requeue(Duration::from_secs(PROVIDER_CONFIG_IN_USE_REQUEUE_SECS)));
    }

    metrics::increment_requeues_total("resync");
    Ok(Action::requeue(ctx.config.resync_interval))
}
