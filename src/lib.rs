use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use std::error::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod collections;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;
pub mod rate_limit;

use handler::AppState;

/// Builds the full application: public routes, bearer-protected routes and
/// the global per-IP rate limit in front of everything.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let protected = Router::new()
        .route("/secure", get(handler::secure))
        .merge(collections::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/", get(handler::healthcheck))
        .route("/login", post(handler::login))
        .route("/addSwipe", post(handler::add_swipe))
        .merge(protected)
        .layer(cors)
        .layer(middleware::from_fn_with_state(state.limiter.clone(), rate_limit::enforce))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
