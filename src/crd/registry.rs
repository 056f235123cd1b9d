//! # Type registry
//!
//! Process-wide table of the kinds served by this provider. Built once on
//! first access and never mutated afterwards. Used by `crdgen` to print the
//! CRDs and by the reconcile core to turn untyped objects into [`Managed`].

use super::managed::Managed;
use super::provider_config::{ProviderConfig, ProviderConfigUsage};
use super::token::Token;
use crate::error::Result;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{DynamicObject, GroupVersionKind};
use kube::{CustomResourceExt, Resource};
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// A registered kind
#[derive(Debug, Clone)]
pub struct KindInfo {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    /// Whether the reconcile core acts on this kind
    pub managed: bool,
    crd: fn() -> CustomResourceDefinition,
}

impl KindInfo {
    fn of<K>(managed: bool) -> Self
    where
        K: Resource<DynamicType = ()> + CustomResourceExt,
    {
        Self {
            group: K::group(&()).into_owned(),
            version: K::version(&()).into_owned(),
            kind: K::kind(&()).into_owned(),
            plural: K::plural(&()).into_owned(),
            managed,
            crd: K::crd,
        }
    }

    /// CustomResourceDefinition for this kind
    #[must_use]
    pub fn crd(&self) -> CustomResourceDefinition {
        (self.crd)()
    }

    #[must_use]
    pub fn api_version(&self) -> String {
        format!("{}/{}", self.group, self.version)
    }

    fn matches(&self, gvk: &GroupVersionKind) -> bool {
        self.group == gvk.group && self.version == gvk.version && self.kind == gvk.kind
    }
}

static REGISTRY: LazyLock<Vec<KindInfo>> = LazyLock::new(|| {
    vec![
        KindInfo::of::<Token>(true),
        KindInfo::of::<ProviderConfig>(false),
        KindInfo::of::<ProviderConfigUsage>(false),
    ]
});

/// Force registry construction. Called once at startup before any controller runs.
pub fn init() -> usize {
    let kinds = kinds();
    for info in kinds {
        debug!(kind = %info.kind, api_version = %info.api_version(), "Registered kind");
    }
    kinds.len()
}

/// All registered kinds
#[must_use]
pub fn kinds() -> &'static [KindInfo] {
    &REGISTRY
}

/// Look up a kind by group, version and kind
#[must_use]
pub fn lookup(gvk: &GroupVersionKind) -> Option<&'static KindInfo> {
    kinds().iter().find(|info| info.matches(gvk))
}

/// Every registered CRD, in registration order
#[must_use]
pub fn crds() -> Vec<CustomResourceDefinition> {
    kinds().iter().map(KindInfo::crd).collect()
}

/// Group, version and kind of an untyped object
#[must_use]
pub fn gvk_of(obj: &DynamicObject) -> GroupVersionKind {
    match &obj.types {
        Some(types) => {
            let (group, version) = types
                .api_version
                .split_once('/')
                .unwrap_or(("", types.api_version.as_str()));
            GroupVersionKind::gvk(group, version, &types.kind)
        }
        None => GroupVersionKind::gvk("", "", ""),
    }
}

/// Decode an untyped object into the managed variant
///
/// Kinds that are not registered as managed decode to [`Managed::Other`].
pub fn decode(obj: DynamicObject) -> Result<Managed> {
    let gvk = gvk_of(&obj);
    match lookup(&gvk) {
        Some(info) if info.managed => {
            let token: Token = serde_json::from_value(serde_json::to_value(obj)?)?;
            Ok(Managed::Token(Arc::new(token)))
        }
        _ => Ok(Managed::Other(gvk)),
    }
}
