//! # Kubernetes Events
//!
//! Trait-based abstraction over `kube::runtime::events::Recorder` so the
//! token adapter and reconcilers emit Events visible via
//! `kubectl describe token <name>`.
//!
//! Events are fire-and-forget: failures are logged as warnings and never
//! propagate. A failed event must never break reconciliation.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Publishes Kubernetes Events about a resource
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an Event on `resource_ref`
    ///
    /// `reason` is machine-readable (see [`reasons`]), `action` names what
    /// was attempted (see [`actions`]).
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Production implementation wrapping `kube::runtime::events::Recorder`
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl std::fmt::Debug for KubeEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEventPublisher").finish_non_exhaustive()
    }
}

impl KubeEventPublisher {
    /// The controller name appears as the reporting component on Events
    #[must_use]
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource_ref).await {
            warn!(reason, action, error = %e, "Failed to publish Kubernetes event");
        }
    }
}

/// An Event captured by [`RecordingEventPublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub object: Option<String>,
    pub warning: bool,
    pub reason: String,
    pub action: String,
    pub note: Option<String>,
}

/// Keeps Events in memory, for tests
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reasons in publication order
    #[must_use]
    pub fn reasons(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.reason).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent {
                object: resource_ref.name.clone(),
                warning: matches!(type_, EventType::Warning),
                reason: reason.to_string(),
                action: action.to_string(),
                note,
            });
    }
}

/// Event reasons, shown under REASON in `kubectl get events`
pub mod reasons {
    /// Logged in to ArgoCD
    pub const SESSION_ESTABLISHED: &str = "SessionEstablished";
    /// A new account token was created in ArgoCD
    pub const TOKEN_MINTED: &str = "TokenMinted";
    /// The token was written to its secret
    pub const SECRET_SAVED: &str = "SecretSaved";
    /// The token secret was removed
    pub const SECRET_DELETED: &str = "SecretDeleted";
    pub const CANNOT_CONNECT: &str = "CannotConnect";
    pub const CANNOT_OBSERVE: &str = "CannotObserve";
    pub const CANNOT_CREATE: &str = "CannotCreate";
    pub const CANNOT_DELETE: &str = "CannotDelete";
    /// A ProviderConfig deletion is blocked by its users
    pub const IN_USE: &str = "InUse";
}

/// Event actions, shown under ACTION in `kubectl get events`
pub mod actions {
    pub const CONNECT: &str = "Connect";
    pub const OBSERVE: &str = "Observe";
    pub const CREATE: &str = "Create";
    pub const DELETE: &str = "Delete";
    pub const RECONCILE: &str = "Reconcile";
}
