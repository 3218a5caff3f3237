mod config;
mod database;
pub mod http_server;
pub mod process;
mod state;

pub use config::Config as ServiceConfig;
pub use process::spawn_service;
pub use state::State as ServiceState;
