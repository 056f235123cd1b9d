use super::{require_namespace, SecretStore, SecretStoreError};
use crate::crd::SecretKeySelector;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Which operation an injected failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
    Delete,
}

/// Process-local secret store
///
/// Secrets are keyed by `(namespace, name)` and hold a key map, so
/// deleting the last key removes the secret like [`super::KubeSecretStore`].
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: Mutex<BTreeMap<(String, String), BTreeMap<String, Vec<u8>>>>,
    failures: Mutex<HashSet<Operation>>,
}

impl InMemorySecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, bypassing failure injection
    pub fn insert(&self, selector: &SecretKeySelector, value: impl Into<Vec<u8>>) {
        self.secrets()
            .entry(Self::coordinates(selector))
            .or_default()
            .insert(selector.key.clone(), value.into());
    }

    /// Read a value, bypassing failure injection
    #[must_use]
    pub fn value(&self, selector: &SecretKeySelector) -> Option<Vec<u8>> {
        self.secrets()
            .get(&Self::coordinates(selector))
            .and_then(|data| data.get(&selector.key).cloned())
    }

    /// Whether the secret object exists, regardless of keys
    #[must_use]
    pub fn contains_secret(&self, namespace: &str, name: &str) -> bool {
        self.secrets()
            .contains_key(&(namespace.to_string(), name.to_string()))
    }

    /// Make every subsequent call of `operation` fail with a backend error
    pub fn fail_on(&self, operation: Operation) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation);
    }

    pub fn clear_failures(&self) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn check(&self, operation: Operation) -> Result<(), SecretStoreError> {
        let failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if failures.contains(&operation) {
            return Err(SecretStoreError::Backend {
                message: format!("injected {operation:?} failure"),
            });
        }
        Ok(())
    }

    fn secrets(&self) -> MutexGuard<'_, BTreeMap<(String, String), BTreeMap<String, Vec<u8>>>> {
        self.secrets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn coordinates(selector: &SecretKeySelector) -> (String, String) {
        (selector.namespace.clone(), selector.name.clone())
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, selector: &SecretKeySelector) -> Result<Vec<u8>, SecretStoreError> {
        require_namespace(selector)?;
        self.check(Operation::Get)?;
        self.value(selector)
            .ok_or_else(|| SecretStoreError::not_found(selector))
    }

    async fn set(&self, selector: &SecretKeySelector, value: &[u8]) -> Result<(), SecretStoreError> {
        require_namespace(selector)?;
        self.check(Operation::Set)?;
        self.insert(selector, value);
        Ok(())
    }

    async fn delete(&self, selector: &SecretKeySelector) -> Result<(), SecretStoreError> {
        require_namespace(selector)?;
        self.check(Operation::Delete)?;
        let mut secrets = self.secrets();
        let coordinates = Self::coordinates(selector);
        if let Some(data) = secrets.get_mut(&coordinates) {
            data.remove(&selector.key);
            if data.is_empty() {
                secrets.remove(&coordinates);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(key: &str) -> SecretKeySelector {
        SecretKeySelector::new("ns", "my-secret", key)
    }

    #[tokio::test]
    async fn test_blank_namespace_is_rejected() {
        let store = InMemorySecretStore::new();
        let blank = SecretKeySelector::new(" ", "my-secret", "token");
        let err = store.set(&blank, b"abc").await.unwrap_err();
        assert!(matches!(err, SecretStoreError::MissingNamespace { .. }));
        assert!(!store.contains_secret(" ", "my-secret"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemorySecretStore::new();
        let err = store.get(&selector("token")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = InMemorySecretStore::new();
        store.set(&selector("token"), b"abc").await.unwrap();
        assert_eq!(store.get(&selector("token")).await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_delete_last_key_removes_secret() {
        let store = InMemorySecretStore::new();
        store.insert(&selector("token"), "abc");
        store.insert(&selector("other"), "xyz");

        store.delete(&selector("token")).await.unwrap();
        assert!(store.contains_secret("ns", "my-secret"));

        store.delete(&selector("other")).await.unwrap();
        assert!(!store.contains_secret("ns", "my-secret"));

        // missing entries are fine
        store.delete(&selector("other")).await.unwrap();
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemorySecretStore::new();
        store.fail_on(Operation::Set);
        let err = store.set(&selector("token"), b"abc").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(store.value(&selector("token")).is_none());

        store.clear_failures();
        store.set(&selector("token"), b"abc").await.unwrap();
    }
}
