//! HTTP request handlers for the calendar endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{RawQuery, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use super::input::FieldMap;
use super::response::{ApiError, ApiResponse};
use crate::calendar::{CalendarService, Event, EventUpdate};
use crate::context::OpContext;
use crate::error::{CalendarError, Result};
use crate::metrics::{HealthState, HealthStatus, Metrics};

/// Application state shared across handlers.
pub struct ApiState {
    /// Scheduling service.
    pub service: Arc<CalendarService>,
    /// Per-router metrics registry.
    pub metrics: Metrics,
    root: OpContext,
    request_timeout: Option<Duration>,
}

impl ApiState {
    pub fn new(service: Arc<CalendarService>) -> Result<Self> {
        Ok(Self {
            service,
            metrics: Metrics::new()?,
            root: OpContext::background(),
            request_timeout: None,
        })
    }

    /// Deadline applied to every request's context.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Context that every request context descends from. Cancelling it
    /// fails all in-flight and future operations with `Cancelled`.
    pub fn root_context(&self) -> &OpContext {
        &self.root
    }

    /// Fresh context for one request.
    pub fn op_context(&self) -> OpContext {
        let ctx = self.root.child();
        match self.request_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    fn record_error(&self, err: CalendarError) -> ApiError {
        if err.is_duplicate() {
            self.metrics.duplicates_rejected_total.inc();
        }
        let err = ApiError::from(err);
        if err.status.is_server_error() && err.status != StatusCode::SERVICE_UNAVAILABLE {
            error!(status = %err.status, error = %err.message, "Calendar operation failed");
        }
        err
    }
}

type HandlerResult<T> = std::result::Result<ApiResponse<T>, ApiError>;

// ============================================================================
// Mutations
// ============================================================================

/// POST /create_event
pub async fn create_event_handler(
    State(state): State<Arc<ApiState>>,
    fields: FieldMap,
) -> HandlerResult<Event> {
    let user_id = fields.user_id()?;
    let date = fields.date()?;
    let title = fields.require("event")?;

    let event = state
        .service
        .create_event(&state.op_context(), user_id, date, title)
        .await
        .map_err(|e| state.record_error(e))?;

    state.metrics.events_created_total.inc();
    Ok(ApiResponse(event))
}

/// POST /update_event
pub async fn update_event_handler(
    State(state): State<Arc<ApiState>>,
    fields: FieldMap,
) -> HandlerResult<Event> {
    let id = fields.require("id")?;

    let mut update = EventUpdate::default();
    if let Some(user_id) = fields.optional_user_id()? {
        update = update.user_id(user_id);
    }
    if let Some(date) = fields.optional_date()? {
        update = update.date(date);
    }
    if let Some(title) = fields.get("event") {
        update = update.title(title);
    }

    let event = state
        .service
        .update_event(&state.op_context(), id, update)
        .await
        .map_err(|e| state.record_error(e))?;

    state.metrics.events_updated_total.inc();
    Ok(ApiResponse(event))
}

/// POST /delete_event
pub async fn delete_event_handler(
    State(state): State<Arc<ApiState>>,
    fields: FieldMap,
) -> HandlerResult<&'static str> {
    let id = fields.require("id")?;

    state
        .service
        .delete_event(&state.op_context(), id)
        .await
        .map_err(|e| state.record_error(e))?;

    state.metrics.events_deleted_total.inc();
    Ok(ApiResponse("deleted"))
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum View {
    Day,
    Week,
    Month,
}

async fn view(state: &ApiState, query: Option<String>, view: View) -> HandlerResult<Vec<Event>> {
    let fields = FieldMap::from_query(query.as_deref());
    let user_id = fields.user_id()?;
    let date = fields.date()?;

    let ctx = state.op_context();
    let service = &state.service;
    let events = match view {
        View::Day => service.events_for_day(&ctx, user_id, date).await,
        View::Week => service.events_for_week(&ctx, user_id, date).await,
        View::Month => service.events_for_month(&ctx, user_id, date).await,
    }
    .map_err(|e| state.record_error(e))?;

    state.metrics.queries_total.inc();
    Ok(ApiResponse(events))
}

/// GET /events_for_day?user_id=..&date=..
pub async fn events_for_day_handler(
    State(state): State<Arc<ApiState>>,
    RawQuery(query): RawQuery,
) -> HandlerResult<Vec<Event>> {
    view(&state, query, View::Day).await
}

/// GET /events_for_week?user_id=..&date=..
pub async fn events_for_week_handler(
    State(state): State<Arc<ApiState>>,
    RawQuery(query): RawQuery,
) -> HandlerResult<Vec<Event>> {
    view(&state, query, View::Week).await
}

/// GET /events_for_month?user_id=..&date=..
pub async fn events_for_month_handler(
    State(state): State<Arc<ApiState>>,
    RawQuery(query): RawQuery,
) -> HandlerResult<Vec<Event>> {
    view(&state, query, View::Month).await
}

// ============================================================================
// Operational endpoints
// ============================================================================

#[derive(Serialize)]
struct HealthBody {
    result: HealthStatus,
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<ApiState>>) -> Response {
    let stats = state.service.stats().await;
    let (status, message) = match state.service.check_consistency().await {
        Ok(()) => (HealthState::Healthy, None),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (HealthState::Unhealthy, Some(e.to_string()))
        }
    };

    let code = StatusCode::from_u16(status.to_status_code()).unwrap_or(StatusCode::OK);
    let body = HealthBody {
        result: HealthStatus {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.metrics.uptime().as_secs(),
            events: stats.events,
            message,
        },
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<ApiState>>) -> Response {
    let stats = state.service.stats().await;
    state.metrics.events_count.set(stats.events as i64);

    match state.metrics.export_prometheus() {
        Ok(text) => (
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to export metrics");
            ApiError::from(CalendarError::from(e)).into_response()
        }
    }
}

/// Fallback for unknown paths.
pub async fn not_found_handler() -> ApiError {
    ApiError::not_found()
}

/// Fallback for known paths hit with the wrong method.
pub async fn method_not_allowed_handler() -> ApiError {
    ApiError::method_not_allowed()
}

/// Cuts off requests, body reads included, that outlive the request timeout.
pub async fn enforce_request_timeout(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(timeout) = state.request_timeout else {
        return next.run(request).await;
    };

    let path = request.uri().path().to_owned();
    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(path = %path, timeout_secs = timeout.as_secs_f64(), "Request timed out");
            ApiError::request_timeout().into_response()
        }
    }
}

/// Times every request and counts error responses.
pub async fn track_requests(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let _timer = Metrics::start_timer(&state.metrics.request_duration_seconds);
    let response = next.run(request).await;
    if response.status().is_client_error() || response.status().is_server_error() {
        state.metrics.request_errors_total.inc();
    }
    response
}
