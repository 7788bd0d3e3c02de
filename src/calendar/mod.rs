//! Calendar module: events, day/week/month views and the scheduling rules.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Calendar Layer                       │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │              CalendarService                       │  │
//! │  │  - Duplicate detection on create                   │  │
//! │  │  - Partial updates                                 │  │
//! │  │  - Day / week / month range derivation             │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                          │                               │
//! │                          ▼                               │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │              EventRepository                       │  │
//! │  │  (MemoryEventStore: by-id + (user, day) index)     │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use calendar_server::calendar::{CalendarService, EventUpdate};
//! use calendar_server::context::OpContext;
//! use calendar_server::storage::MemoryEventStore;
//! use std::sync::Arc;
//!
//! let service = CalendarService::new(Arc::new(MemoryEventStore::new()));
//! let ctx = OpContext::background();
//!
//! let event = service.create_event(&ctx, 1, date, "Meet").await?;
//! let week = service.events_for_week(&ctx, 1, date).await?;
//! service
//!     .update_event(&ctx, &event.id, EventUpdate::default().title("Sync"))
//!     .await?;
//! ```

pub mod dates;
mod id;
mod service;
pub mod types;

pub use dates::{day_start, month_bounds, normalize_date, parse_day, week_bounds};
pub use id::IdGenerator;
pub use service::{CalendarService, Clock};
pub use types::{Event, EventUpdate};
