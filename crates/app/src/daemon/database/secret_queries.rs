use std::str::FromStr;

use async_trait::async_trait;
use mime::Mime;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use common::prelude::{
    AccessTally, ResourceKind, ResourcePayload, SecretRecord, SecretStore, SecretStoreError,
};

use super::Database;

#[derive(Debug, thiserror::Error)]
pub enum SqliteStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn secret_from_row(row: &SqliteRow) -> Result<SecretRecord, SqliteStoreError> {
    let resource_id: String = row.try_get("resource_id")?;
    let resource_id = Uuid::parse_str(&resource_id)
        .map_err(|e| SqliteStoreError::Corrupt(format!("bad resource id: {}", e)))?;

    Ok(SecretRecord {
        access_name: row.try_get("access_name")?,
        created: row.try_get("created")?,
        resource_id,
        access_code: row.try_get("access_code")?,
        number_of_accesses: row.try_get("number_of_accesses")?,
    })
}

#[async_trait]
impl SecretStore for Database {
    type Error = SqliteStoreError;

    async fn insert(
        &self,
        resource: &ResourcePayload,
        record: &SecretRecord,
    ) -> Result<(), SecretStoreError<Self::Error>> {
        let mut tx = self
            .begin()
            .await
            .map_err(|e| SecretStoreError::Provider(e.into()))?;

        let resource_id = record.resource_id.to_string();
        match resource {
            ResourcePayload::Url(url) => {
                sqlx::query("INSERT INTO resources (resource_id, kind, url) VALUES (?1, 'url', ?2)")
                    .bind(&resource_id)
                    .bind(url)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| SecretStoreError::Provider(e.into()))?;
            }
            ResourcePayload::File {
                bytes,
                content_type,
            } => {
                sqlx::query(
                    "INSERT INTO resources (resource_id, kind, file, content_type) VALUES (?1, 'file', ?2, ?3)",
                )
                .bind(&resource_id)
                .bind(bytes.as_slice())
                .bind(content_type.as_ref())
                .execute(&mut *tx)
                .await
                .map_err(|e| SecretStoreError::Provider(e.into()))?;
            }
        }

        let inserted = sqlx::query(
            "INSERT INTO secrets (access_name, created, resource_id, access_code, number_of_accesses) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&record.access_name)
        .bind(record.created)
        .bind(&resource_id)
        .bind(&record.access_code)
        .bind(record.number_of_accesses)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => tx
                .commit()
                .await
                .map_err(|e| SecretStoreError::Provider(e.into())),
            // Rolling back keeps the resource row from leaking when the
            // access name collides.
            Err(e) if is_unique_violation(&e) => {
                let _ = tx.rollback().await;
                Err(SecretStoreError::NameTaken)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(SecretStoreError::Provider(e.into()))
            }
        }
    }

    async fn load(
        &self,
        access_name: &str,
    ) -> Result<Option<SecretRecord>, SecretStoreError<Self::Error>> {
        let row = sqlx::query(
            "SELECT access_name, created, resource_id, access_code, number_of_accesses \
             FROM secrets WHERE access_name = ?1",
        )
        .bind(access_name)
        .fetch_optional(&**self)
        .await
        .map_err(|e| SecretStoreError::Provider(e.into()))?;

        row.map(|row| secret_from_row(&row))
            .transpose()
            .map_err(SecretStoreError::Provider)
    }

    async fn increment_accesses(
        &self,
        access_name: &str,
    ) -> Result<i64, SecretStoreError<Self::Error>> {
        // The single-statement read-modify-write keeps concurrent accesses
        // on one name from losing updates.
        let row = sqlx::query(
            "UPDATE secrets SET number_of_accesses = number_of_accesses + 1 \
             WHERE access_name = ?1 RETURNING number_of_accesses",
        )
        .bind(access_name)
        .fetch_optional(&**self)
        .await
        .map_err(|e| SecretStoreError::Provider(e.into()))?;

        let row = row.ok_or(SecretStoreError::Missing)?;
        row.try_get("number_of_accesses")
            .map_err(|e| SecretStoreError::Provider(e.into()))
    }

    async fn resource(
        &self,
        resource_id: Uuid,
    ) -> Result<ResourcePayload, SecretStoreError<Self::Error>> {
        let row = sqlx::query(
            "SELECT kind, url, file, content_type FROM resources WHERE resource_id = ?1",
        )
        .bind(resource_id.to_string())
        .fetch_optional(&**self)
        .await
        .map_err(|e| SecretStoreError::Provider(e.into()))?;

        let row = row.ok_or(SecretStoreError::Missing)?;
        let kind: String = row
            .try_get("kind")
            .map_err(|e| SecretStoreError::Provider(e.into()))?;

        match ResourceKind::from_str(&kind) {
            ResourceKind::Url => {
                let url: Option<String> = row
                    .try_get("url")
                    .map_err(|e| SecretStoreError::Provider(e.into()))?;
                let url = url.ok_or_else(|| {
                    SecretStoreError::Provider(SqliteStoreError::Corrupt(
                        "url resource without a url".to_string(),
                    ))
                })?;
                Ok(ResourcePayload::Url(url))
            }
            ResourceKind::File => {
                let bytes: Option<Vec<u8>> = row
                    .try_get("file")
                    .map_err(|e| SecretStoreError::Provider(e.into()))?;
                let content_type: Option<String> = row
                    .try_get("content_type")
                    .map_err(|e| SecretStoreError::Provider(e.into()))?;

                let bytes = bytes.ok_or_else(|| {
                    SecretStoreError::Provider(SqliteStoreError::Corrupt(
                        "file resource without content".to_string(),
                    ))
                })?;
                let content_type = content_type
                    .as_deref()
                    .and_then(|value| Mime::from_str(value).ok())
                    .ok_or_else(|| {
                        SecretStoreError::Provider(SqliteStoreError::Corrupt(
                            "file resource without a content type".to_string(),
                        ))
                    })?;

                Ok(ResourcePayload::File {
                    bytes,
                    content_type,
                })
            }
        }
    }

    async fn scan(&self) -> Result<Vec<AccessTally>, SecretStoreError<Self::Error>> {
        let rows = sqlx::query(
            "SELECT s.created, r.kind, s.number_of_accesses \
             FROM secrets s JOIN resources r ON r.resource_id = s.resource_id",
        )
        .fetch_all(&**self)
        .await
        .map_err(|e| SecretStoreError::Provider(e.into()))?;

        rows.iter()
            .map(|row| {
                let kind: String = row.try_get("kind")?;
                Ok(AccessTally {
                    created: row.try_get("created")?,
                    kind: ResourceKind::from_str(&kind),
                    number_of_accesses: row.try_get("number_of_accesses")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| SecretStoreError::Provider(e.into()))
    }
}
