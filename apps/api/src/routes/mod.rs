pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::alerts::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/subscriptions", post(handlers::handle_subscribe))
        .route(
            "/api/v1/subscriptions/verify",
            post(handlers::handle_verify),
        )
        .route("/api/v1/alerts/dispatch", post(handlers::handle_dispatch))
        .with_state(state)
}
