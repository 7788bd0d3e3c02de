//! Cancellation and deadline context for service operations.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{CalendarError, Result};

/// Carries a cancellation token and an optional deadline into every service call.
///
/// Checks are advisory: operations look at the context before they start and
/// never stop half-way through a store mutation.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Set a deadline `timeout` from now. A timeout too large to represent
    /// leaves the context without a deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Derive a child context; cancelling the parent cancels the child.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with [`CalendarError::Cancelled`] if the context is done.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(CalendarError::Cancelled)
        } else {
            Ok(())
        }
    }
}
