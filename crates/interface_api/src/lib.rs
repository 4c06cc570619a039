//! HTTP API Layer
//!
//! REST surface of the hospitalization account assurance workflow, built
//! on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one assurance endpoint plus liveness and readiness
//! - **Middleware**: request logging with a generated request id
//! - **DTOs**: camelCase request and response bodies
//! - **Error Handling**: `ApiError` maps domain errors to status codes
//!
//! The router only sees the `AccountAssurance` facade, so the server wires
//! in PostgreSQL while tests wire in the in-memory store.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(Arc::new(service), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_admission::AccountAssurance;

use crate::config::ApiConfig;
use crate::handlers::{admission, health};
use crate::middleware::request_logging_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub assurance: Arc<dyn AccountAssurance>,
    pub config: ApiConfig,
}

/// Creates the main API router
pub fn create_router(assurance: Arc<dyn AccountAssurance>, config: ApiConfig) -> Router {
    let state = AppState { assurance, config };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let admission_routes = Router::new().route(
        "/:episode_id/account",
        post(admission::assure_account),
    );

    let api_routes = Router::new()
        .nest("/hospitalizations", admission_routes)
        .layer(axum_middleware::from_fn(request_logging_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
