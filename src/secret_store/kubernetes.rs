use super::{require_namespace, SecretStore, SecretStoreError};
use crate::constants::FIELD_MANAGER;
use crate::crd::SecretKeySelector;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::debug;

/// Secret store backed by Kubernetes `Secret` objects
///
/// Every selector must name its namespace.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, selector: &SecretKeySelector) -> Result<Api<Secret>, SecretStoreError> {
        let namespace = require_namespace(selector)?;
        Ok(Api::namespaced(self.client.clone(), namespace))
    }
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == 404)
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, selector: &SecretKeySelector) -> Result<Vec<u8>, SecretStoreError> {
        let secret = match self.api(selector)?.get(&selector.name).await {
            Ok(secret) => secret,
            Err(e) if is_not_found(&e) => return Err(SecretStoreError::not_found(selector)),
            Err(e) => return Err(e.into()),
        };

        secret
            .data
            .and_then(|mut data| data.remove(&selector.key))
            .map(|bytes| bytes.0)
            .ok_or_else(|| SecretStoreError::not_found(selector))
    }

    async fn set(&self, selector: &SecretKeySelector, value: &[u8]) -> Result<(), SecretStoreError> {
        let api = self.api(selector)?;
        match api.get_opt(&selector.name).await? {
            Some(_) => {
                let patch = serde_json::json!({
                    "data": { selector.key.as_str(): ByteString(value.to_vec()) }
                });
                api.patch(
                    &selector.name,
                    &PatchParams::apply(FIELD_MANAGER),
                    &Patch::Merge(&patch),
                )
                .await?;
                debug!(secret = %selector, "Patched secret key");
            }
            None => {
                let secret = Secret {
                    metadata: ObjectMeta {
                        name: Some(selector.name.clone()),
                        ..ObjectMeta::default()
                    },
                    type_: Some("Opaque".to_string()),
                    data: Some(BTreeMap::from([(
                        selector.key.clone(),
                        ByteString(value.to_vec()),
                    )])),
                    ..Secret::default()
                };
                api.create(&PostParams::default(), &secret).await?;
                debug!(secret = %selector, "Created secret");
            }
        }
        Ok(())
    }

    async fn delete(&self, selector: &SecretKeySelector) -> Result<(), SecretStoreError> {
        let api = self.api(selector)?;
        let Some(secret) = api.get_opt(&selector.name).await? else {
            debug!(secret = %selector, "Secret already gone");
            return Ok(());
        };

        let data = secret.data.unwrap_or_default();
        if !data.contains_key(&selector.key) {
            return Ok(());
        }

        if data.len() == 1 {
            match api.delete(&selector.name, &DeleteParams::default()).await {
                Ok(_) => debug!(secret = %selector, "Deleted secret"),
                Err(e) if is_not_found(&e) => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            let patch = serde_json::json!({ "data": { selector.key.as_str(): null } });
            api.patch(
                &selector.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;
            debug!(secret = %selector, "Removed key from shared secret");
        }
        Ok(())
    }
}
