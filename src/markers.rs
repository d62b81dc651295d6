//! Two-generation store of detector hints shared between the decode thread
//! (appends) and the render thread (snapshot + rotate).
//!
//! The lock is held only for an append or for the swap; drawing happens on
//! the owned snapshot after the lock is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::ResultPoint;

/// Maximum hints kept in the batch being accumulated.
pub const MAX_RESULT_POINTS: usize = 20;
/// How many of the newest hints survive an overflow.
pub const RETAINED_ON_OVERFLOW: usize = MAX_RESULT_POINTS / 2;

#[derive(Default)]
struct Batches {
    current: Vec<ResultPoint>,
    previous: Arc<Vec<ResultPoint>>,
}

/// What one render pass draws: the batch just taken (full opacity) and the
/// faded batch retained from an earlier pass.
#[derive(Debug, Clone, Default)]
pub struct MarkerSnapshot {
    pub current: Vec<ResultPoint>,
    pub previous: Arc<Vec<ResultPoint>>,
}

impl MarkerSnapshot {
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }
}

/// Render-side handle. Cloning shares the same buffer.
#[derive(Clone, Default)]
pub struct MarkerBuffer {
    inner: Arc<Mutex<Batches>>,
}

/// Decoder-side handle: can only append.
#[derive(Clone)]
pub struct MarkerSink {
    inner: Arc<Mutex<Batches>>,
}

// A panic on the other thread must not stop the overlay from drawing.
fn lock(inner: &Mutex<Batches>) -> MutexGuard<'_, Batches> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn append(inner: &Mutex<Batches>, p: ResultPoint) {
    let mut batches = lock(inner);
    let points = &mut batches.current;
    points.push(p);
    let size = points.len();
    if size > MAX_RESULT_POINTS {
        // trim the oldest, keep the newest half
        points.drain(..size - RETAINED_ON_OVERFLOW);
    }
}

impl MarkerBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer handle for the decode thread.
    pub fn sink(&self) -> MarkerSink {
        MarkerSink { inner: Arc::clone(&self.inner) }
    }

    pub fn add_point(&self, p: ResultPoint) {
        append(&self.inner, p);
    }

    /// Take the accumulated batch, leaving a fresh empty one behind.
    ///
    /// Returns the taken batch together with the previous batch as retained
    /// before this call. The taken batch becomes the new previous only when
    /// it is non-empty, so the fade persists across passes with no new hints.
    pub fn snapshot_and_rotate(&self) -> MarkerSnapshot {
        let mut batches = lock(&self.inner);
        let current = std::mem::take(&mut batches.current);
        let previous = Arc::clone(&batches.previous);
        if !current.is_empty() {
            batches.previous = Arc::new(current.clone());
        }
        MarkerSnapshot { current, previous }
    }

    /// Drop both generations.
    pub fn clear(&self) {
        let mut batches = lock(&self.inner);
        batches.current.clear();
        batches.previous = Arc::default();
    }

    /// Hints appended since the last rotation.
    pub fn pending_len(&self) -> usize {
        lock(&self.inner).current.len()
    }

    /// Copy of the accumulating batch, without rotating.
    pub fn pending(&self) -> Vec<ResultPoint> {
        lock(&self.inner).current.clone()
    }

    /// Copy of the retained faded batch, without rotating.
    pub fn retained(&self) -> Arc<Vec<ResultPoint>> {
        Arc::clone(&lock(&self.inner).previous)
    }
}

impl MarkerSink {
    pub fn add_point(&self, p: ResultPoint) {
        append(&self.inner, p);
    }
}
