// Rewards Gateway Library
// Exposes the router and its modules for the binary and for testing

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// Build the HTTP router over a running ledger actor.
///
/// Wrong verbs on the ledger routes get a 405 from the method router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/add-points", post(handlers::add_points))
        .route("/use-points", post(handlers::use_points))
        .route("/check-balance", get(handlers::check_balance))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
