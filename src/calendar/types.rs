//! Calendar event types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dates::{day_format, normalize_date};

// ============================================================================
// Event
// ============================================================================

/// A single calendar entry owned by one user on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier, assigned at creation and never changed.
    pub id: String,
    /// Owning user.
    pub user_id: i64,
    /// The UTC day this event falls on.
    #[serde(with = "day_format")]
    pub date: NaiveDate,
    /// Event text.
    #[serde(rename = "event")]
    pub title: String,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// When the event was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Build an event stamped with `now` for both timestamps.
    pub fn new(
        id: impl Into<String>,
        user_id: i64,
        date: NaiveDate,
        title: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id,
            date,
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Partial update
// ============================================================================

/// Fields to change on an existing event. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    /// New owner.
    pub user_id: Option<i64>,
    /// New day; truncated to the UTC day when applied.
    pub date: Option<DateTime<Utc>>,
    /// New title.
    pub title: Option<String>,
}

impl EventUpdate {
    pub fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.date.is_none() && self.title.is_none()
    }

    /// Apply this update to an event. Timestamps are left to the caller.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(user_id) = self.user_id {
            event.user_id = user_id;
        }
        if let Some(date) = self.date {
            event.date = normalize_date(date);
        }
        if let Some(ref title) = self.title {
            event.title = title.clone();
        }
    }
}
