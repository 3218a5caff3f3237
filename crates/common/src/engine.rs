use std::collections::BTreeMap;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::resource::{ResourceError, ResourceInput, ResourcePayload};
use crate::secret::{self, SecretRecord};
use crate::statistics::{self, DayCounts};
use crate::store::{SecretStore, SecretStoreError};

/// How many times create regenerates identifiers after an access name
/// conflict before giving up.
const MAX_NAME_ATTEMPTS: usize = 3;

/// Identifiers handed back to the creator of a secret. The access code is
/// disclosed here and never again by any other operation.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedSecret {
    pub access_name: String,
    pub access_code: String,
    pub created: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("no secret under that access name")]
    NotFound,
    #[error("wrong access code")]
    InvalidCode,
    #[error("secret is no longer available")]
    Gone,
    #[error("secret store error: {0}")]
    Store(String),
}

impl EngineError {
    fn store<E: std::fmt::Display>(err: SecretStoreError<E>) -> Self {
        EngineError::Store(err.to_string())
    }
}

/// The secret lifecycle engine.
///
/// Owns the rules for creating, unlocking, and tallying shared secrets;
/// persistence is delegated to a [`SecretStore`]. Expiry is a computed
/// property of a record's age, never a stored state: records stay in the
/// store forever and simply refuse access once past the TTL.
#[derive(Debug, Clone)]
pub struct Engine<S: SecretStore> {
    config: EngineConfig,
    store: S,
}

impl<S: SecretStore> Engine<S> {
    pub fn new(config: EngineConfig, store: S) -> Self {
        Self { config, store }
    }

    /// Create a new secret around the submitted resource.
    ///
    /// Validates the resource shape, persists the payload and its record
    /// in one atomic store insert, and returns the identifiers for the
    /// creator. The access name doubles as the uniqueness check: on the
    /// statistically negligible chance of a collision the insert fails
    /// and fresh identifiers are generated.
    pub async fn create(&self, input: ResourceInput) -> Result<IssuedSecret, EngineError> {
        let payload = input.validate(&self.config.allowed_file_types)?;
        let created = OffsetDateTime::now_utc();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let record = SecretRecord {
                access_name: secret::generate_access_name(),
                created,
                resource_id: Uuid::new_v4(),
                access_code: secret::generate_access_code(
                    self.config.access_code_length,
                    self.config.access_code_alphabet,
                ),
                number_of_accesses: 0,
            };

            match self.store.insert(&payload, &record).await {
                Ok(()) => {
                    tracing::debug!(
                        access_name = %record.access_name,
                        kind = payload.kind().as_str(),
                        "created secret"
                    );
                    return Ok(IssuedSecret {
                        access_name: record.access_name,
                        access_code: record.access_code,
                        created,
                    });
                }
                Err(SecretStoreError::NameTaken) => continue,
                Err(e) => return Err(EngineError::store(e)),
            }
        }

        Err(EngineError::Store(
            "exhausted access name attempts".to_string(),
        ))
    }

    /// Unlock a secret and return its resource payload.
    ///
    /// Checks run in a fixed order: lookup by name, then the access code
    /// in constant time, then the TTL. A wrong code on an expired secret
    /// therefore reports `InvalidCode`, not `Gone`. On success the access
    /// counter is incremented and persisted before the payload, freshly
    /// read from the store, is returned. Every successful call counts;
    /// there is no access limit, only the time limit.
    pub async fn access(
        &self,
        access_name: &str,
        submitted_code: &str,
    ) -> Result<ResourcePayload, EngineError> {
        let record = self
            .store
            .load(access_name)
            .await
            .map_err(EngineError::store)?
            .ok_or(EngineError::NotFound)?;

        if !secret::constant_time_eq(&record.access_code, submitted_code) {
            return Err(EngineError::InvalidCode);
        }

        if OffsetDateTime::now_utc() - record.created > self.config.ttl {
            return Err(EngineError::Gone);
        }

        let accesses = self
            .store
            .increment_accesses(access_name)
            .await
            .map_err(EngineError::store)?;
        let payload = self
            .store
            .resource(record.resource_id)
            .await
            .map_err(EngineError::store)?;

        tracing::debug!(access_name, accesses, "secret accessed");

        Ok(payload)
    }

    /// Aggregate per-day access statistics over every record in the store.
    pub async fn statistics(&self) -> Result<BTreeMap<String, DayCounts>, EngineError> {
        let tallies = self.store.scan().await.map_err(EngineError::store)?;
        Ok(statistics::aggregate(&tallies))
    }
}
