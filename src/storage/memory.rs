//! In-memory event store.
//!
//! A primary map from ID to event plus a secondary index
//! `user_id -> day -> {event IDs}`. Both live behind one reader/writer lock
//! and every mutation updates them together before the lock is released.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::error;

use super::traits::{EventRepository, StoreResult, StoreStats};
use crate::calendar::Event;
use crate::error::StoreError;

type DayIndex = BTreeMap<NaiveDate, BTreeSet<String>>;

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<String, Event>,
    by_user_date: HashMap<i64, DayIndex>,
}

impl Inner {
    fn index(&mut self, user_id: i64, date: NaiveDate, id: &str) {
        self.by_user_date
            .entry(user_id)
            .or_default()
            .entry(date)
            .or_default()
            .insert(id.to_string());
    }

    /// Drop `id` from its bucket, pruning the bucket and the user map once empty.
    fn unindex(&mut self, user_id: i64, date: NaiveDate, id: &str) {
        let Some(days) = self.by_user_date.get_mut(&user_id) else {
            return;
        };
        if let Some(ids) = days.get_mut(&date) {
            ids.remove(id);
            if ids.is_empty() {
                days.remove(&date);
            }
        }
        if days.is_empty() {
            self.by_user_date.remove(&user_id);
        }
    }

    fn resolve<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> Vec<Event> {
        ids.into_iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }
}

/// Thread-safe in-memory implementation of [`EventRepository`].
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for MemoryEventStore {
    async fn create(&self, event: Event) -> StoreResult<Event> {
        let mut inner = self.inner.write();

        if inner.by_id.contains_key(&event.id) {
            error!(id = %event.id, "event id collision");
            return Err(StoreError::AlreadyExists(event.id));
        }

        inner.index(event.user_id, event.date, &event.id);
        inner.by_id.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn update(&self, event: Event) -> StoreResult<Event> {
        let mut inner = self.inner.write();

        let (old_user, old_date) = match inner.by_id.get(&event.id) {
            Some(old) => (old.user_id, old.date),
            None => return Err(StoreError::NotFound(event.id)),
        };

        if old_user != event.user_id || old_date != event.date {
            inner.unindex(old_user, old_date, &event.id);
            inner.index(event.user_id, event.date, &event.id);
        }

        inner.by_id.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();

        let event = inner
            .by_id
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        inner.unindex(event.user_id, event.date, id);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Event> {
        let inner = self.inner.read();
        inner
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_for_date(&self, user_id: i64, date: NaiveDate) -> StoreResult<Vec<Event>> {
        let inner = self.inner.read();

        let mut events = inner
            .by_user_date
            .get(&user_id)
            .and_then(|days| days.get(&date))
            .map(|ids| inner.resolve(ids))
            .unwrap_or_default();

        events.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(events)
    }

    async fn list_for_range(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Event>> {
        if from >= to {
            return Ok(Vec::new());
        }

        let inner = self.inner.read();

        let mut events = match inner.by_user_date.get(&user_id) {
            Some(days) => inner.resolve(days.range(from..to).flat_map(|(_, ids)| ids)),
            None => Vec::new(),
        };

        events.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(events)
    }

    async fn exists_by_user_date_title(
        &self,
        user_id: i64,
        date: NaiveDate,
        title: &str,
    ) -> StoreResult<bool> {
        let inner = self.inner.read();

        let exists = inner
            .by_user_date
            .get(&user_id)
            .and_then(|days| days.get(&date))
            .is_some_and(|ids| {
                ids.iter()
                    .filter_map(|id| inner.by_id.get(id))
                    .any(|event| event.title == title)
            });
        Ok(exists)
    }

    async fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            events: inner.by_id.len(),
            users: inner.by_user_date.len(),
            buckets: inner.by_user_date.values().map(BTreeMap::len).sum(),
        }
    }

    async fn check_consistency(&self) -> StoreResult<()> {
        let inner = self.inner.read();
        let mut indexed = 0usize;

        for (user_id, days) in &inner.by_user_date {
            if days.is_empty() {
                return Err(StoreError::IndexCorrupted(format!(
                    "empty day map for user {user_id}"
                )));
            }
            for (date, ids) in days {
                if ids.is_empty() {
                    return Err(StoreError::IndexCorrupted(format!(
                        "empty bucket for user {user_id} on {date}"
                    )));
                }
                for id in ids {
                    let event = inner.by_id.get(id).ok_or_else(|| {
                        StoreError::IndexCorrupted(format!("dangling index entry {id}"))
                    })?;
                    if event.user_id != *user_id || event.date != *date {
                        return Err(StoreError::IndexCorrupted(format!(
                            "event {id} indexed under user {user_id} on {date}"
                        )));
                    }
                    indexed += 1;
                }
            }
        }

        if indexed != inner.by_id.len() {
            return Err(StoreError::IndexCorrupted(format!(
                "{} events stored but {indexed} indexed",
                inner.by_id.len()
            )));
        }
        Ok(())
    }
}
