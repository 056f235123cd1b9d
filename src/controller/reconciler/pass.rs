//! # Reconcile pass
//!
//! One Connect, one Observe and at most one external actuation per pass.
//! A deleting Token that never minted a token is released even when Argo CD
//! cannot be reached.
//! The outcome describes the conditions to report and what to do next; the
//! caller applies it to the Kubernetes object.

use crate::controller::external::{ExternalClient, ExternalConnector, ExternalObservation};
use crate::crd::{Condition, Managed, Token, TokenObservation};
use crate::error::Error;
use crate::observability::events::{actions, reasons, EventPublisher};
use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The actuation chosen after Observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Create,
    /// Never has an external effect
    Update,
    Delete,
    /// Deleting and nothing left to remove
    Finalize,
    Idle,
}

impl Step {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Finalize => "finalize",
            Self::Idle => "idle",
        }
    }
}

/// Pick the actuation for an observation
#[must_use]
pub const fn plan(deleting: bool, observation: ExternalObservation) -> Step {
    match (deleting, observation.resource_exists) {
        (true, true) => Step::Delete,
        (true, false) => Step::Finalize,
        (false, false) => Step::Create,
        (false, true) if !observation.resource_up_to_date => Step::Update,
        (false, true) => Step::Idle,
    }
}

/// When to look at the resource again after a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Soon, to observe the effect of an actuation
    Poll,
    /// At the regular resync interval
    Resync,
}

#[derive(Debug)]
pub struct PassOutcome {
    /// `None` when the pass failed before Observe
    pub step: Option<Step>,
    /// `None` keeps the current Ready condition
    pub ready: Option<Condition>,
    pub synced: Condition,
    /// Set after a successful Create
    pub at_provider: Option<TokenObservation>,
    pub remove_finalizer: bool,
    pub requeue: Requeue,
    pub error: Option<Error>,
}

impl PassOutcome {
    fn succeeded(step: Step, ready: Condition, requeue: Requeue) -> Self {
        Self {
            step: Some(step),
            ready: Some(ready),
            synced: Condition::reconcile_success(),
            at_provider: None,
            remove_finalizer: false,
            requeue,
            error: None,
        }
    }

    fn failed(step: Option<Step>, ready: Option<Condition>, error: Error) -> Self {
        Self {
            step,
            ready,
            synced: Condition::reconcile_error(error.to_string()),
            at_provider: None,
            remove_finalizer: false,
            requeue: Requeue::Poll,
            error: Some(error),
        }
    }
}

async fn warn_event(events: &dyn EventPublisher, token: &Token, reason: &str, action: &str, error: &Error) {
    events
        .publish(
            &token.object_ref(&()),
            EventType::Warning,
            reason,
            action,
            Some(error.to_string()),
        )
        .await;
}

/// A Token whose external state has been observed
pub struct Observed {
    client: Box<dyn ExternalClient>,
    mg: Managed,
    pub step: Step,
}

impl std::fmt::Debug for Observed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observed").field("step", &self.step).finish_non_exhaustive()
    }
}

/// A deleting Token that never minted anything has nothing to clean up
fn never_created(token: &Token) -> bool {
    token.meta().deletion_timestamp.is_some()
        && token
            .status
            .as_ref()
            .and_then(|status| status.at_provider.id.as_ref())
            .is_none()
}

fn release_uncreated(token: &Token, error: &Error) -> PassOutcome {
    info!(
        token = %token.name_any(),
        error = %error,
        "Releasing token that was never created"
    );
    let mut outcome = PassOutcome::succeeded(Step::Finalize, Condition::deleting(), Requeue::Poll);
    outcome.remove_finalizer = true;
    outcome
}

/// Connect and Observe, then plan the actuation
///
/// # Errors
///
/// Returns the finished outcome when the pass cannot get past Observe.
pub async fn connect_and_observe(
    token: Arc<Token>,
    connector: &dyn ExternalConnector,
    events: &dyn EventPublisher,
) -> Result<Observed, PassOutcome> {
    let deleting = token.meta().deletion_timestamp.is_some();
    let mg = Managed::Token(Arc::clone(&token));

    let client = match connector.connect(&mg).await {
        Ok(client) => client,
        Err(e) => {
            if never_created(&token) {
                return Err(release_uncreated(&token, &e));
            }
            warn!(token = %token.name_any(), error = %e, "Cannot connect to Argo CD");
            warn_event(events, &token, reasons::CANNOT_CONNECT, actions::CONNECT, &e).await;
            return Err(PassOutcome::failed(None, None, e));
        }
    };

    let observation = match client.observe(&mg).await {
        Ok(observation) => observation,
        Err(e) => {
            if never_created(&token) {
                return Err(release_uncreated(&token, &e));
            }
            warn!(token = %token.name_any(), error = %e, "Cannot observe token");
            warn_event(events, &token, reasons::CANNOT_OBSERVE, actions::OBSERVE, &e).await;
            return Err(PassOutcome::failed(None, None, e));
        }
    };

    let step = plan(deleting, observation);
    debug!(token = %token.name_any(), step = step.as_str(), ?observation, "Planned reconcile step");
    Ok(Observed { client, mg, step })
}

/// Run the planned actuation
pub async fn actuate(token: &Token, observed: Observed, events: &dyn EventPublisher) -> PassOutcome {
    let Observed { client, mg, step } = observed;

    match step {
        Step::Delete => match client.delete(&mg).await {
            Ok(()) => {
                let mut outcome = PassOutcome::succeeded(step, Condition::deleting(), Requeue::Poll);
                outcome.remove_finalizer = true;
                outcome
            }
            Err(e) => {
                warn!(token = %token.name_any(), error = %e, "Cannot delete token");
                warn_event(events, token, reasons::CANNOT_DELETE, actions::DELETE, &e).await;
                PassOutcome::failed(Some(step), Some(Condition::deleting()), e)
            }
        },
        Step::Finalize => {
            let mut outcome = PassOutcome::succeeded(step, Condition::deleting(), Requeue::Poll);
            outcome.remove_finalizer = true;
            outcome
        }
        Step::Create => match client.create(&mg).await {
            Ok(creation) => {
                let mut outcome = PassOutcome::succeeded(step, Condition::creating(), Requeue::Poll);
                outcome.at_provider = Some(TokenObservation {
                    id: creation.token_id,
                    expires_in: creation.expires_in,
                });
                outcome
            }
            Err(e) => {
                warn!(token = %token.name_any(), error = %e, "Cannot create token");
                warn_event(events, token, reasons::CANNOT_CREATE, actions::CREATE, &e).await;
                PassOutcome::failed(Some(step), Some(Condition::creating()), e)
            }
        },
        Step::Update => match client.update(&mg).await {
            Ok(()) => PassOutcome::succeeded(step, Condition::available(), Requeue::Resync),
            Err(e) => PassOutcome::failed(Some(step), None, e),
        },
        Step::Idle => PassOutcome::succeeded(step, Condition::available(), Requeue::Resync),
    }
}

/// Run Connect, Observe and the planned actuation for one Token
pub async fn run_pass(
    token: Arc<Token>,
    connector: &dyn ExternalConnector,
    events: &dyn EventPublisher,
) -> PassOutcome {
    match connect_and_observe(Arc::clone(&token), connector, events).await {
        Ok(observed) => actuate(&token, observed, events).await,
        Err(outcome) => outcome,
    }
}
