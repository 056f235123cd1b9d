//! # Conditions
//!
//! Status conditions shared by Tokens and ProviderConfigs.
//!
//! Tokens carry two condition types, mirroring the crossplane managed
//! resource contract:
//! - `Ready`: `Creating`, `Deleting` or `Available`
//! - `Synced`: `ReconcileSuccess` or `ReconcileError`

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type reporting whether the external token is usable
pub const CONDITION_READY: &str = "Ready";

/// Condition type reporting whether the last reconcile pass succeeded
pub const CONDITION_SYNCED: &str = "Synced";

/// Reason: the token is being minted and stored
pub const REASON_CREATING: &str = "Creating";
/// Reason: the stored token is being removed
pub const REASON_DELETING: &str = "Deleting";
/// Reason: the token secret exists
pub const REASON_AVAILABLE: &str = "Available";
/// Reason: the last reconcile pass succeeded
pub const REASON_RECONCILE_SUCCESS: &str = "ReconcileSuccess";
/// Reason: the last reconcile pass failed
pub const REASON_RECONCILE_ERROR: &str = "ReconcileError";
/// Reason: a ProviderConfig cannot be deleted while in use
pub const REASON_IN_USE: &str = "InUse";

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last time the status changed (RFC3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Machine-readable reason
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    fn new(r#type: &str, status: bool, reason: &str, message: Option<String>) -> Self {
        Self {
            r#type: r#type.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
            reason: Some(reason.to_string()),
            message,
        }
    }

    #[must_use]
    pub fn creating() -> Self {
        Self::new(CONDITION_READY, false, REASON_CREATING, None)
    }

    #[must_use]
    pub fn deleting() -> Self {
        Self::new(CONDITION_READY, false, REASON_DELETING, None)
    }

    #[must_use]
    pub fn available() -> Self {
        Self::new(CONDITION_READY, true, REASON_AVAILABLE, None)
    }

    #[must_use]
    pub fn reconcile_success() -> Self {
        Self::new(CONDITION_SYNCED, true, REASON_RECONCILE_SUCCESS, None)
    }

    #[must_use]
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self::new(
            CONDITION_SYNCED,
            false,
            REASON_RECONCILE_ERROR,
            Some(message.into()),
        )
    }

    #[must_use]
    pub fn in_use(users: i64) -> Self {
        Self::new(
            CONDITION_READY,
            false,
            REASON_IN_USE,
            Some(format!("ProviderConfig is still used by {users} resource(s)")),
        )
    }

    /// Whether two conditions carry the same observable state
    fn same_state(&self, other: &Self) -> bool {
        self.status == other.status && self.reason == other.reason && self.message == other.message
    }
}

/// Insert or replace the condition of the same type
///
/// The transition time of an existing condition is kept unless its status
/// flips. Returns `true` when the list changed.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) -> bool {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) if existing.same_state(&condition) => false,
        Some(existing) => {
            let keep_time = existing.status == condition.status;
            let previous_time = existing.last_transition_time.take();
            *existing = condition;
            if keep_time {
                existing.last_transition_time = previous_time;
            }
            true
        }
        None => {
            conditions.push(condition);
            true
        }
    }
}

/// Find a condition by type
#[must_use]
pub fn find_condition<'a>(conditions: &'a [Condition], r#type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == r#type)
}
