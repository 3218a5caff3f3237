use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::{SecretStore, SecretStoreError};
use crate::resource::ResourcePayload;
use crate::secret::SecretRecord;
use crate::statistics::AccessTally;

/// In-memory secret store backed by HashMaps, for tests and ephemeral runs
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    inner: Arc<RwLock<MemorySecretStoreInner>>,
}

#[derive(Debug, Default)]
struct MemorySecretStoreInner {
    /// resource_id -> payload; immutable once written
    resources: HashMap<Uuid, ResourcePayload>,
    /// access_name -> record
    secrets: HashMap<String, SecretRecord>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemorySecretStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    type Error = MemorySecretStoreError;

    async fn insert(
        &self,
        resource: &ResourcePayload,
        record: &SecretRecord,
    ) -> Result<(), SecretStoreError<Self::Error>> {
        let mut inner = self.inner.write().map_err(|e| {
            SecretStoreError::Provider(MemorySecretStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        if inner.secrets.contains_key(&record.access_name) {
            return Err(SecretStoreError::NameTaken);
        }

        inner.resources.insert(record.resource_id, resource.clone());
        inner
            .secrets
            .insert(record.access_name.clone(), record.clone());

        Ok(())
    }

    async fn load(
        &self,
        access_name: &str,
    ) -> Result<Option<SecretRecord>, SecretStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            SecretStoreError::Provider(MemorySecretStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        Ok(inner.secrets.get(access_name).cloned())
    }

    async fn increment_accesses(
        &self,
        access_name: &str,
    ) -> Result<i64, SecretStoreError<Self::Error>> {
        let mut inner = self.inner.write().map_err(|e| {
            SecretStoreError::Provider(MemorySecretStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        let record = inner
            .secrets
            .get_mut(access_name)
            .ok_or(SecretStoreError::Missing)?;
        record.number_of_accesses += 1;

        Ok(record.number_of_accesses)
    }

    async fn resource(
        &self,
        resource_id: Uuid,
    ) -> Result<ResourcePayload, SecretStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            SecretStoreError::Provider(MemorySecretStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        inner
            .resources
            .get(&resource_id)
            .cloned()
            .ok_or(SecretStoreError::Missing)
    }

    async fn scan(&self) -> Result<Vec<AccessTally>, SecretStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            SecretStoreError::Provider(MemorySecretStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        inner
            .secrets
            .values()
            .map(|record| {
                let kind = inner
                    .resources
                    .get(&record.resource_id)
                    .map(|payload| payload.kind())
                    .ok_or(SecretStoreError::Missing)?;
                Ok(AccessTally {
                    created: record.created,
                    kind,
                    number_of_accesses: record.number_of_accesses,
                })
            })
            .collect()
    }
}
