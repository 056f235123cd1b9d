//! # Status Management
//!
//! Folds a pass outcome into the Token status and patches it only when
//! something observable changed.

use super::pass::PassOutcome;
use crate::constants::FIELD_MANAGER;
use crate::crd::{set_condition, Token, TokenStatus};
use crate::error::Result;
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use tracing::debug;

/// Status after applying `outcome`, or `None` when unchanged
#[must_use]
pub fn next_status(current: Option<&TokenStatus>, outcome: &PassOutcome) -> Option<TokenStatus> {
    let mut status = current.cloned().unwrap_or_default();
    let mut changed = current.is_none();

    if let Some(ready) = &outcome.ready {
        changed |= set_condition(&mut status.conditions, ready.clone());
    }
    changed |= set_condition(&mut status.conditions, outcome.synced.clone());

    if let Some(at_provider) = &outcome.at_provider {
        if status.at_provider != *at_provider {
            status.at_provider = at_provider.clone();
            changed = true;
        }
    }

    changed.then_some(status)
}

/// Patch the status subresource if the outcome changes it
pub async fn update_status(api: &Api<Token>, token: &Token, outcome: &PassOutcome) -> Result<()> {
    let Some(status) = next_status(token.status.as_ref(), outcome) else {
        debug!(token = %token.name_any(), "Skipping status update - unchanged");
        return Ok(());
    };

    let patch = serde_json::json!({ "status": status });
    api.patch_status(
        &token.name_any(),
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(())
}
