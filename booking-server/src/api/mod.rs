//! HTTP API
//!
//! Each submodule exposes `router()`; [`build_app`] merges them and adds
//! the middleware stack.

pub mod auth;
pub mod bookings;
pub mod health;
pub mod tables;

use axum::{Router, middleware};
use http::{HeaderValue, Method, header};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::{Result, ServerError, ServerState};

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(tables::router())
        .merge(bookings::router())
}

/// Fully configured application: routes, auth, CORS, tracing, timeout
pub fn build_app(state: &ServerState) -> Result<Router> {
    let origin = state
        .config
        .cors_allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ServerError::Config(format!("Invalid CORS_ALLOWED_ORIGIN: {e}")))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = build_router()
        // JWT authentication; public routes are skipped inside require_auth
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(state.config.request_timeout())),
        );

    Ok(app)
}
