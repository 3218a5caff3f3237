use url::Url;

use common::prelude::Engine;

use super::config::Config;
use super::database::{Database, DatabaseSetupError};

/// Main service state - wires the lifecycle engine to its SQLite store
#[derive(Clone)]
pub struct State {
    database: Database,
    engine: Engine<Database>,
    api_token: String,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => Url::parse(&format!("sqlite://{}", path.display()))
                .map_err(|_| StateSetupError::InvalidDatabaseUrl),
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Build the engine over the database as its secret store
        let engine = Engine::new(config.engine.clone(), database.clone());

        Ok(Self {
            database,
            engine,
            api_token: config.api_token.clone(),
        })
    }

    pub fn engine(&self) -> &Engine<Database> {
        &self.engine
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
}
