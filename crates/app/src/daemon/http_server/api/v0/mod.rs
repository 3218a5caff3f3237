use axum::routing::get;
use axum::Router;

pub mod secret;
pub mod statistics;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/secret", secret::router(state.clone()))
        .route("/statistics", get(statistics::handler))
        .with_state(state)
}
