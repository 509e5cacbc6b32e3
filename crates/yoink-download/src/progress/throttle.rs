//! Progress throttling.
//!
//! Rate-limits progress updates to avoid overwhelming observers with events.
//! Status transitions go through [`ProgressThrottle::admit`] with `force`
//! set and are never dropped.

use std::time::{Duration, Instant};

/// Rate-limiter for progress updates.
///
/// Ensures progress events are not emitted more frequently than the
/// configured interval.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a new throttle with the specified minimum interval.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// Check if enough time has passed to emit another progress update.
    pub fn should_emit(&mut self) -> bool {
        self.should_emit_at(Instant::now())
    }

    /// [`should_emit`](Self::should_emit) against an explicit clock reading.
    pub fn should_emit_at(&mut self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }

    /// Decide whether to notify. Forced admissions always pass and restart
    /// the window.
    pub fn admit(&mut self, force: bool) -> bool {
        if force {
            self.last_emit = Some(Instant::now());
            return true;
        }
        self.should_emit()
    }
}
