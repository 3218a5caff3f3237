use axum::routing::{post, put};
use axum::Router;

pub mod access;
pub mod create;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(create::handler))
        .route("/:access_name", put(access::handler))
        .with_state(state)
}
