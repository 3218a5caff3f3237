use axum::routing::get;
use axum::Router;

mod version;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/version", get(version::handler))
        .with_state(state)
}
