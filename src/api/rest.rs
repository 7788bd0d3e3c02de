//! REST API router and configuration.

use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    create_event_handler, delete_event_handler, enforce_request_timeout, events_for_day_handler,
    events_for_month_handler, events_for_week_handler, health_handler, method_not_allowed_handler,
    metrics_handler, not_found_handler, track_requests, update_event_handler, ApiState,
};
use crate::config::ServerConfig;

/// REST API configuration.
#[derive(Debug, Clone, Default)]
pub struct RestApiConfig {
    /// Enable permissive CORS.
    pub enable_cors: bool,
}

impl From<&ServerConfig> for RestApiConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            enable_cors: server.enable_cors,
        }
    }
}

/// Wrong-method requests on a known path get a JSON 405.
fn only(route: MethodRouter<Arc<ApiState>>) -> MethodRouter<Arc<ApiState>> {
    route.fallback(method_not_allowed_handler)
}

/// Create the calendar router.
///
/// Endpoints:
/// - POST /create_event
/// - POST /update_event
/// - POST /delete_event
/// - GET  /events_for_day?user_id=..&date=..
/// - GET  /events_for_week?user_id=..&date=..
/// - GET  /events_for_month?user_id=..&date=..
/// - GET  /health
/// - GET  /metrics
pub fn create_router(state: Arc<ApiState>, config: &RestApiConfig) -> Router {
    let router = Router::new()
        .route("/create_event", only(post(create_event_handler)))
        .route("/update_event", only(post(update_event_handler)))
        .route("/delete_event", only(post(delete_event_handler)))
        .route("/events_for_day", only(get(events_for_day_handler)))
        .route("/events_for_week", only(get(events_for_week_handler)))
        .route("/events_for_month", only(get(events_for_month_handler)))
        .route("/health", only(get(health_handler)))
        .route("/metrics", only(get(metrics_handler)))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(state.clone(), enforce_request_timeout))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_origin(Any);

        router.layer(cors)
    } else {
        router
    }
}
