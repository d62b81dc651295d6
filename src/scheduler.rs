//! Redraw scheduling with a single pending slot.
//!
//! Every request lands in the same slot: a second request before the first
//! fires merges into it (earliest deadline, union of regions) instead of
//! queueing another. Time is passed in so hosts and tests share one clock.

use std::time::{Duration, Instant};

use crate::types::Rect;

/// Delay between animation frames (~25 fps).
pub const ANIMATION_DELAY: Duration = Duration::from_millis(40);

/// A redraw waiting to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawRequest {
    pub due: Instant,
    /// Region to repaint; None repaints the whole surface.
    pub region: Option<Rect>,
}

#[derive(Debug)]
pub struct RedrawScheduler {
    delay: Duration,
    pending: Option<RedrawRequest>,
}

impl Default for RedrawScheduler {
    fn default() -> Self {
        Self::new(ANIMATION_DELAY)
    }
}

impl RedrawScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Next animation frame after a completed render, limited to `dirty`.
    pub fn schedule_next(&mut self, now: Instant, dirty: Rect) {
        self.request(now + self.delay, Some(dirty));
    }

    /// Full-surface redraw as soon as possible.
    pub fn request_now(&mut self, now: Instant) {
        self.request(now, None);
    }

    fn request(&mut self, due: Instant, region: Option<Rect>) {
        self.pending = Some(match self.pending.take() {
            None => RedrawRequest { due, region },
            Some(prev) => RedrawRequest {
                due: prev.due.min(due),
                region: match (prev.region, region) {
                    (Some(a), Some(b)) => Some(a.union(&b)),
                    _ => None,
                },
            },
        });
    }

    /// Take the pending request if it is due.
    pub fn take_due(&mut self, now: Instant) -> Option<RedrawRequest> {
        match self.pending {
            Some(req) if req.due <= now => self.pending.take(),
            _ => None,
        }
    }

    /// Drop the pending request without firing it.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn pending(&self) -> Option<&RedrawRequest> {
        self.pending.as_ref()
    }

    /// How long until the pending request is due (zero if overdue).
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending.map(|req| req.due.saturating_duration_since(now))
    }
}
