//! Event storage.
//!
//! - `EventRepository`: the storage contract the scheduling service depends on
//! - `MemoryEventStore`: process-local implementation with a secondary
//!   `(user, day)` index for date-range queries

mod memory;
mod traits;

pub use memory::MemoryEventStore;
pub use traits::*;

use std::sync::Arc;

/// Create the default storage backend.
pub fn create_storage() -> Arc<dyn EventRepository> {
    Arc::new(MemoryEventStore::new())
}
