//! Storage trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::Event;
use crate::error::StoreError;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Store occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Live events.
    pub events: usize,
    /// Users with at least one event.
    pub users: usize,
    /// Non-empty (user, day) buckets.
    pub buckets: usize,
}

/// Trait for event storage backends.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event. Fails if its ID is already taken.
    async fn create(&self, event: Event) -> StoreResult<Event>;

    /// Replace a stored event, reindexing it if its user or day moved.
    async fn update(&self, event: Event) -> StoreResult<Event>;

    /// Remove an event.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Get an event by ID.
    async fn get_by_id(&self, id: &str) -> StoreResult<Event>;

    /// A user's events on one day, oldest first.
    async fn list_for_date(&self, user_id: i64, date: NaiveDate) -> StoreResult<Vec<Event>>;

    /// A user's events on days in `[from, to)`, by day then creation time.
    async fn list_for_range(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Event>>;

    /// Whether the user already has an event with this title on this day.
    async fn exists_by_user_date_title(
        &self,
        user_id: i64,
        date: NaiveDate,
        title: &str,
    ) -> StoreResult<bool>;

    /// Current occupancy.
    async fn stats(&self) -> StoreStats;

    /// Verify that every index entry matches a stored event and vice versa.
    async fn check_consistency(&self) -> StoreResult<()>;
}
