//! Read-only admin views of the registry and the load counters.

pub mod handlers;

use axum::{routing::get, Router};

use crate::http::server::AppState;
use self::handlers::*;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/hosts", get(get_hosts))
        .route("/admin/load", get(get_load))
        .with_state(state)
}
