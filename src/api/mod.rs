//! HTTP API for the calendar service.
//!
//! Form or JSON bodies are normalized into a [`FieldMap`], validated, passed to
//! the [`CalendarService`](crate::calendar::CalendarService) and answered with
//! a `{"result": ...}` or `{"error": ...}` JSON envelope.

mod handlers;
mod input;
mod response;
mod rest;

pub use handlers::*;
pub use input::FieldMap;
pub use response::{ApiError, ApiResponse};
pub use rest::*;
