//! Calendar server: per-user events over HTTP.
//!
//! An in-memory event store indexed by ID and by (user, day), a scheduling
//! service that enforces one title per user per day and derives day, week
//! and month views, and a JSON/form HTTP front end.

pub mod api;
pub mod calendar;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod server;
pub mod storage;

pub use api::{create_router, ApiError, ApiResponse, ApiState, FieldMap, RestApiConfig};
pub use calendar::{CalendarService, Event, EventUpdate, IdGenerator};
pub use config::Config;
pub use context::OpContext;
pub use error::{CalendarError, ConfigError, Result, StoreError};
pub use metrics::{HealthState, HealthStatus, Metrics};
pub use server::{run_http, serve, shutdown_signal};
pub use storage::{create_storage, EventRepository, MemoryEventStore, StoreStats};
