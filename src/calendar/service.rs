//! Scheduling service: business rules over the event store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use super::dates::{month_bounds, normalize_date, week_bounds};
use super::id::IdGenerator;
use super::types::{Event, EventUpdate};
use crate::context::OpContext;
use crate::error::{CalendarError, Result};
use crate::storage::{EventRepository, StoreStats};

/// Source of "now" for event timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Creates, updates, deletes and lists events for users.
pub struct CalendarService {
    repo: Arc<dyn EventRepository>,
    ids: IdGenerator,
    clock: Clock,
    /// Serializes the duplicate check with the insert that follows it.
    create_lock: Mutex<()>,
}

impl CalendarService {
    /// Create a service over `repo` using the system clock.
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self {
            repo,
            ids: IdGenerator::new(),
            clock: Arc::new(Utc::now),
            create_lock: Mutex::new(()),
        }
    }

    /// Replace the clock used for `created_at` / `updated_at`.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the ID generator.
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create an event for `user_id` on the UTC day of `date`.
    ///
    /// Fails with [`CalendarError::Duplicate`] if the user already has an
    /// event with the same title on that day.
    pub async fn create_event(
        &self,
        ctx: &OpContext,
        user_id: i64,
        date: DateTime<Utc>,
        title: impl Into<String>,
    ) -> Result<Event> {
        ctx.check()?;
        let title = require_title(title.into())?;
        let date = normalize_date(date);

        let _guard = self.create_lock.lock().await;
        if self
            .repo
            .exists_by_user_date_title(user_id, date, &title)
            .await?
        {
            debug!(user_id, %date, "Rejected duplicate event");
            return Err(CalendarError::Duplicate);
        }

        let now = self.now();
        let event = Event::new(self.ids.next_id_at(now), user_id, date, title, now);
        let event = self.repo.create(event).await?;
        debug!(id = %event.id, user_id, %date, "Created event");
        Ok(event)
    }

    /// Apply a partial update to an existing event.
    ///
    /// Only the fields set in `update` change. The user/day/title uniqueness
    /// rule is not re-checked here, so an update may produce a triple that
    /// `create_event` would reject.
    pub async fn update_event(
        &self,
        ctx: &OpContext,
        id: &str,
        update: EventUpdate,
    ) -> Result<Event> {
        ctx.check()?;
        if let Some(title) = update.title.as_deref() {
            if title.trim().is_empty() {
                return Err(blank_title());
            }
        }

        let mut event = self.repo.get_by_id(id).await?;
        update.apply_to(&mut event);
        event.updated_at = self.now();

        let event = self.repo.update(event).await?;
        debug!(id = %event.id, user_id = event.user_id, date = %event.date, "Updated event");
        Ok(event)
    }

    /// Delete an event by ID.
    pub async fn delete_event(&self, ctx: &OpContext, id: &str) -> Result<()> {
        ctx.check()?;
        self.repo.delete(id).await?;
        debug!(id, "Deleted event");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get an event by ID.
    pub async fn get_event(&self, ctx: &OpContext, id: &str) -> Result<Event> {
        ctx.check()?;
        Ok(self.repo.get_by_id(id).await?)
    }

    /// Events for the UTC day of `date`.
    pub async fn events_for_day(
        &self,
        ctx: &OpContext,
        user_id: i64,
        date: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        ctx.check()?;
        let day = normalize_date(date);
        Ok(self.repo.list_for_date(user_id, day).await?)
    }

    /// Events for the Monday-to-Sunday week containing `date`.
    pub async fn events_for_week(
        &self,
        ctx: &OpContext,
        user_id: i64,
        date: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        ctx.check()?;
        let (from, to) = week_bounds(normalize_date(date))?;
        Ok(self.repo.list_for_range(user_id, from, to).await?)
    }

    /// Events for the calendar month containing `date`.
    pub async fn events_for_month(
        &self,
        ctx: &OpContext,
        user_id: i64,
        date: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        ctx.check()?;
        let (from, to) = month_bounds(normalize_date(date))?;
        Ok(self.repo.list_for_range(user_id, from, to).await?)
    }

    /// Store occupancy.
    pub async fn stats(&self) -> StoreStats {
        self.repo.stats().await
    }

    /// Verify the store's indexes agree with its records.
    pub async fn check_consistency(&self) -> Result<()> {
        Ok(self.repo.check_consistency().await?)
    }
}

fn require_title(title: String) -> Result<String> {
    if title.trim().is_empty() {
        Err(blank_title())
    } else {
        Ok(title)
    }
}

fn blank_title() -> CalendarError {
    CalendarError::InvalidInput("event is required".to_string())
}
