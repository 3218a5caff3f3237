use std::ops::Deref;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use url::Url;

mod secret_queries;

/// Handle on the SQLite pool backing the daemon's secret store.
#[derive(Debug, Clone)]
pub struct Database(SqlitePool);

impl Database {
    pub async fn connect(url: &Url) -> Result<Self, DatabaseSetupError> {
        let connect_options =
            SqliteConnectOptions::from_str(url.as_str())?.create_if_missing(true);

        // An in-memory database lives and dies with its connection, so the
        // pool must hold exactly one and never retire it.
        let pool = if url.as_str().contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(connect_options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(connect_options).await?
        };

        sqlx::migrate!().run(&pool).await?;

        Ok(Self(pool))
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("database connection error: {0}")]
    Connection(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
