/**
 * Lifecycle configuration: time-to-live, access
 *  code shape, and the file type allow-list.
 */
pub mod config;
/**
 * The secret lifecycle engine. Orchestrates
 *  creation, access, and statistics against a
 *  pluggable secret store.
 */
pub mod engine;
/**
 * Resource payloads: a validated URL or sniffed
 *  file content. Handles shape validation and
 *  content type detection.
 */
pub mod resource;
/**
 * Secret records and the identifiers that guard
 *  them: access names and access codes.
 */
pub mod secret;
/**
 * Read-only access statistics derived from
 *  secret records.
 */
pub mod statistics;
/**
 * Storage layer abstraction. A trait for secret
 *  stores plus an in-memory implementation.
 */
pub mod store;

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::{Engine, EngineError, IssuedSecret};
    pub use crate::resource::{ResourceError, ResourceInput, ResourceKind, ResourcePayload};
    pub use crate::secret::SecretRecord;
    pub use crate::statistics::{AccessTally, DayCounts};
    pub use crate::store::{MemorySecretStore, SecretStore, SecretStoreError};
}
