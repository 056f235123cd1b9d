//! # Controller Metrics
//!
//! Metrics for reconciliations, minted tokens, token secrets and requeues.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, IntGaugeVec};
use std::sync::LazyLock;

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "argocd_token_reconciliations_total",
            "Total number of reconciliations",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "argocd_token_reconciliation_errors_total",
            "Total number of reconciliation errors by error class",
        ),
        &["kind", "class"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "argocd_token_reconciliation_duration_seconds",
            "Duration of a Token reconcile pass in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static TOKENS_MINTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "argocd_token_tokens_minted_total",
        "Total number of account tokens minted in Argo CD",
    )
    .expect("Failed to create TOKENS_MINTED_TOTAL metric - this should never happen")
});

static SECRETS_SAVED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "argocd_token_secrets_saved_total",
        "Total number of token secrets written",
    )
    .expect("Failed to create SECRETS_SAVED_TOTAL metric - this should never happen")
});

static SECRETS_DELETED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "argocd_token_secrets_deleted_total",
        "Total number of token secrets removed",
    )
    .expect("Failed to create SECRETS_DELETED_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "argocd_token_requeues_total",
            "Total number of reconciliation requeues",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static PROVIDER_CONFIG_USERS: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "argocd_token_provider_config_users",
            "Number of managed resources using each ProviderConfig",
        ),
        &["provider_config"],
    )
    .expect("Failed to create PROVIDER_CONFIG_USERS metric - this should never happen")
});

/// Register controller metrics with the registry
pub(crate) fn register_controller_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(TOKENS_MINTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_SAVED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_DELETED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROVIDER_CONFIG_USERS.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str, class: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[kind, class])
        .inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_tokens_minted() {
    TOKENS_MINTED_TOTAL.inc();
}

pub fn increment_secrets_saved() {
    SECRETS_SAVED_TOTAL.inc();
}

pub fn increment_secrets_deleted() {
    SECRETS_DELETED_TOTAL.inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn set_provider_config_users(provider_config: &str, users: i64) {
    PROVIDER_CONFIG_USERS
        .with_label_values(&[provider_config])
        .set(users);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.with_label_values(&["Token"]).get();
        increment_reconciliations("Token");
        let after = RECONCILIATIONS_TOTAL.with_label_values(&["Token"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_reconciliation_errors_by_class() {
        let before = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["Token", "transient"])
            .get();
        increment_reconciliation_errors("Token", "transient");
        let after = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["Token", "transient"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_token_counters() {
        let minted = TOKENS_MINTED_TOTAL.get();
        let saved = SECRETS_SAVED_TOTAL.get();
        let deleted = SECRETS_DELETED_TOTAL.get();
        increment_tokens_minted();
        increment_secrets_saved();
        increment_secrets_deleted();
        assert_eq!(TOKENS_MINTED_TOTAL.get(), minted + 1);
        assert_eq!(SECRETS_SAVED_TOTAL.get(), saved + 1);
        assert_eq!(SECRETS_DELETED_TOTAL.get(), deleted + 1);
    }

    #[test]
    fn test_requeue_reasons() {
        let before = REQUEUES_TOTAL.with_label_values(&["resync"]).get();
        increment_requeues_total("resync");
        assert_eq!(REQUEUES_TOTAL.with_label_values(&["resync"]).get(), before + 1);
    }

    #[test]
    fn test_provider_config_users_gauge() {
        set_provider_config_users("default", 3);
        assert_eq!(PROVIDER_CONFIG_USERS.with_label_values(&["default"]).get(), 3);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        observe_reconciliation_duration(0.25);
    }
}
