use std::fmt::{Debug, Display};

use async_trait::async_trait;
use uuid::Uuid;

use crate::resource::ResourcePayload;
use crate::secret::SecretRecord;
use crate::statistics::AccessTally;

mod memory;

pub use memory::MemorySecretStore;

#[derive(thiserror::Error, Debug)]
pub enum SecretStoreError<T> {
    /// Provider-specific failure
    #[error("unhandled secret store provider error: {0}")]
    Provider(#[from] T),
    /// An insert collided with an existing access name
    #[error("access name already exists")]
    NameTaken,
    /// A referenced row is missing
    #[error("missing record")]
    Missing,
}

#[async_trait]
pub trait SecretStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug;

    /// Persist a resource and its owning secret record as one atomic unit.
    ///
    /// Should fail with the following errors to be considered correct:
    /// * `Err(SecretStoreError::NameTaken)` - a record with the same
    ///   access name already exists; neither row may be left behind
    async fn insert(
        &self,
        resource: &ResourcePayload,
        record: &SecretRecord,
    ) -> Result<(), SecretStoreError<Self::Error>>;

    /// Load the secret record for an access name, if present.
    async fn load(
        &self,
        access_name: &str,
    ) -> Result<Option<SecretRecord>, SecretStoreError<Self::Error>>;

    /// Atomically add one to a record's access counter and return the new
    /// value.
    ///
    /// Concurrent calls on the same name must each be counted; two calls
    /// both observing N and both writing N + 1 is a correctness bug.
    ///
    /// # Returns
    /// * `Ok(i64)` - the counter value after this increment
    /// * `Err(SecretStoreError::Missing)` - no record under that name
    async fn increment_accesses(
        &self,
        access_name: &str,
    ) -> Result<i64, SecretStoreError<Self::Error>>;

    /// Read the resource payload owned by a secret.
    ///
    /// Always a fresh read; file bytes come back exactly as stored.
    async fn resource(
        &self,
        resource_id: Uuid,
    ) -> Result<ResourcePayload, SecretStoreError<Self::Error>>;

    /// Scan every secret record for statistics aggregation.
    async fn scan(&self) -> Result<Vec<AccessTally>, SecretStoreError<Self::Error>>;
}
