use std::net::SocketAddr;
use std::path::PathBuf;

use common::prelude::EngineConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the API server to listen on
    pub listen_addr: SocketAddr,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // authentication
    /// static bearer token required by the create and
    ///  statistics endpoints
    pub api_token: String,

    // lifecycle configuration
    /// rules for the secret engine: ttl, access code
    ///  shape, allowed file types
    pub engine: EngineConfig,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
