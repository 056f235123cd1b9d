//! Token connector tests
//!
//! ProviderConfig lookup, usage tracking, credential resolution and login.

mod common;

use argocd_token_provider::constants::PROVIDER_CONFIG_LABEL;
use argocd_token_provider::controller::external::ExternalConnector;
use argocd_token_provider::crd::{Managed, SecretKeySelector};
use argocd_token_provider::error::{Error, ErrorClass};
use argocd_token_provider::observability::events::reasons;
use common::{admin_secret, provider_config, token, token_from, Harness, TOKEN_UID};
use kube::ResourceExt;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_connect_logs_in_with_admin_password() {
    let h = Harness::new();

    h.connector.connect(&Managed::from(token())).await.unwrap();

    assert_eq!(
        h.sessions.logins(),
        [("argocd.local".to_string(), "admin".to_string(), "s3cr3t".to_string())]
    );
    assert_eq!(h.events.reasons(), [reasons::SESSION_ESTABLISHED]);
}

#[tokio::test]
async fn test_connect_records_usage() {
    let h = Harness::new();

    h.connector.connect(&Managed::from(token())).await.unwrap();

    let usages = h.provider_configs.usages();
    let usage = usages.get(TOKEN_UID).expect("usage named after the token uid");
    assert_eq!(usage.spec.provider_config_ref.name, "default");
    assert_eq!(usage.spec.resource_ref.kind, "Token");
    assert_eq!(usage.spec.resource_ref.name, "alice-token");
    assert_eq!(usage.labels().get(PROVIDER_CONFIG_LABEL).map(String::as_str), Some("default"));
    let owner = &usage.owner_references()[0];
    assert_eq!(owner.uid, TOKEN_UID);
    assert_eq!(owner.controller, Some(true));
}

#[tokio::test]
async fn test_repeated_connects_keep_one_usage() {
    let h = Harness::new();
    let mg = Managed::from(token());

    h.connector.connect(&mg).await.unwrap();
    h.connector.connect(&mg).await.unwrap();

    assert_eq!(h.provider_configs.usages().len(), 1);
    assert_eq!(h.sessions.logins().len(), 2);
}

#[tokio::test]
async fn test_omitted_provider_config_ref_uses_default() {
    let h = Harness::new();
    let mg = Managed::from(token_from(serde_json::json!({
        "forProvider": {
            "account": "alice",
            "writeTokenSecretToRef": { "name": "my-secret", "namespace": "ns", "key": "token" }
        }
    })));

    h.connector.connect(&mg).await.unwrap();

    assert_eq!(h.sessions.logins().len(), 1);
    assert_eq!(h.provider_configs.usages()[TOKEN_UID].spec.provider_config_ref.name, "default");
}

#[tokio::test]
async fn test_blank_provider_config_ref() {
    let h = Harness::new();
    let mg = Managed::from(token_from(serde_json::json!({
        "providerConfigRef": { "name": " " },
        "forProvider": {
            "account": "alice",
            "writeTokenSecretToRef": { "name": "my-secret", "namespace": "ns", "key": "token" }
        }
    })));

    let err = h.connector.connect(&mg).await.err().unwrap();

    assert!(matches!(err, Error::MissingProviderConfigRef));
    assert_eq!(err.to_string(), "providerConfigRef is not given");
    assert!(h.sessions.logins().is_empty());
}

#[tokio::test]
async fn test_session_event_names_account_and_secret() {
    let h = Harness::new();

    h.connector.connect(&Managed::from(token())).await.unwrap();

    let events = h.events.events();
    let note = events[0].note.as_deref().unwrap();
    assert!(note.contains("argocd.local"), "{note}");
    assert!(note.contains("alice"), "{note}");
    assert!(note.contains("ns/my-secret#token"), "{note}");
}

#[tokio::test]
async fn test_unknown_provider_config() {
    let h = Harness::empty();

    let err = h.connector.connect(&Managed::from(token())).await.err().unwrap();

    assert!(matches!(err, Error::ProviderConfigNotFound { ref name } if name == "default"));
    assert_eq!(err.class(), ErrorClass::Configuration);
}

#[tokio::test]
async fn test_unsupported_source_fails_before_login() {
    let h = Harness::empty();
    h.provider_configs.insert(provider_config(serde_json::json!({
        "serverAddr": "argocd.local",
        "credentials": { "source": "InjectedIdentity" }
    })));

    let err = h.connector.connect(&Managed::from(token())).await.err().unwrap();

    assert!(matches!(err, Error::UnsupportedCredentialsSource { ref kind } if kind == "InjectedIdentity"));
    assert!(h.sessions.logins().is_empty());
}

#[tokio::test]
async fn test_secret_ref_overrides_are_honoured() {
    let h = Harness::empty();
    h.provider_configs.insert(provider_config(serde_json::json!({
        "serverAddr": "https://argocd.example.com",
        "credentials": {
            "source": "Secret",
            "secretRef": { "name": " argocd-admin ", "namespace": "", "key": "admin-password" }
        }
    })));
    h.secrets.insert(
        &SecretKeySelector::new("argocd", "argocd-admin", "admin-password"),
        "hunter2",
    );

    h.connector.connect(&Managed::from(token())).await.unwrap();

    let logins = h.sessions.logins();
    assert_eq!(logins[0].0, "https://argocd.example.com");
    assert_eq!(logins[0].2, "hunter2");
}

#[tokio::test]
async fn test_missing_admin_secret() {
    let h = Harness::empty();
    h.provider_configs
        .insert(provider_config(serde_json::json!({ "serverAddr": "argocd.local" })));

    let err = h.connector.connect(&Managed::from(token())).await.err().unwrap();

    assert!(
        matches!(err, Error::CredentialsUnavailable { ref secret, .. } if *secret == admin_secret().to_string())
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_rejected_login_is_returned() {
    let h = Harness::new();
    h.sessions.reject.store(true, Ordering::SeqCst);

    let err = h.connector.connect(&Managed::from(token())).await.err().unwrap();

    assert!(matches!(err, Error::AuthenticationFailed { .. }));
    assert!(h.events.reasons().is_empty());
}
