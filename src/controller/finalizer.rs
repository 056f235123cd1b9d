//! # Finalizers
//!
//! Finalizers are written with a JSON merge patch of the whole list, which
//! keeps entries owned by other controllers intact.

use kube::api::{Patch, PatchParams};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

#[must_use]
pub fn has_finalizer<K: Resource>(obj: &K, finalizer: &str) -> bool {
    obj.finalizers().iter().any(|f| f == finalizer)
}

/// Finalizer list with `finalizer` appended, or `None` if already present
#[must_use]
pub fn with_finalizer<K: Resource>(obj: &K, finalizer: &str) -> Option<Vec<String>> {
    if has_finalizer(obj, finalizer) {
        return None;
    }
    let mut finalizers = obj.finalizers().to_vec();
    finalizers.push(finalizer.to_string());
    Some(finalizers)
}

/// Finalizer list without `finalizer`, or `None` if absent
#[must_use]
pub fn without_finalizer<K: Resource>(obj: &K, finalizer: &str) -> Option<Vec<String>> {
    if !has_finalizer(obj, finalizer) {
        return None;
    }
    Some(
        obj.finalizers()
            .iter()
            .filter(|f| *f != finalizer)
            .cloned()
            .collect(),
    )
}

async fn patch_finalizers<K>(api: &Api<K>, obj: &K, finalizers: Vec<String>) -> kube::Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let patch = serde_json::json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Add `finalizer` unless present. Returns whether a patch was sent.
pub async fn add_finalizer<K>(api: &Api<K>, obj: &K, finalizer: &str) -> kube::Result<bool>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let Some(finalizers) = with_finalizer(obj, finalizer) else {
        return Ok(false);
    };
    debug!(name = %obj.name_any(), finalizer, "Adding finalizer");
    patch_finalizers(api, obj, finalizers).await?;
    Ok(true)
}

/// Remove `finalizer` if present. A vanished object counts as done.
pub async fn remove_finalizer<K>(api: &Api<K>, obj: &K, finalizer: &str) -> kube::Result<bool>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let Some(finalizers) = without_finalizer(obj, finalizer) else {
        return Ok(false);
    };
    debug!(name = %obj.name_any(), finalizer, "Removing finalizer");
    match patch_finalizers(api, obj, finalizers).await {
        Ok(()) => Ok(true),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
        Err(e) => Err(e),
    }
}
