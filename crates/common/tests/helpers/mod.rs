//! Shared test utilities for engine integration tests
#![allow(dead_code)]

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use common::prelude::*;
use common::secret;

/// PNG signature followed by an IHDR chunk header, enough for content
/// sniffing to detect image/png
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
    0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x03,
];

/// Set up an engine over a fresh in-memory store with default rules
pub fn setup_engine() -> (Engine<MemorySecretStore>, MemorySecretStore) {
    let store = MemorySecretStore::new();
    let engine = Engine::new(EngineConfig::default(), store.clone());
    (engine, store)
}

pub fn setup_engine_with_config(
    config: EngineConfig,
) -> (Engine<MemorySecretStore>, MemorySecretStore) {
    let store = MemorySecretStore::new();
    let engine = Engine::new(config, store.clone());
    (engine, store)
}

/// Insert a record directly, bypassing the engine, so tests can control
/// the creation timestamp. Returns the record as stored.
pub async fn insert_backdated(
    store: &MemorySecretStore,
    payload: &ResourcePayload,
    age: Duration,
) -> SecretRecord {
    let record = SecretRecord {
        access_name: secret::generate_access_name(),
        created: OffsetDateTime::now_utc() - age,
        resource_id: Uuid::new_v4(),
        access_code: "ABCDEF".to_string(),
        number_of_accesses: 0,
    };
    store.insert(payload, &record).await.unwrap();
    record
}
