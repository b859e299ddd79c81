//! Search control: the flags shared with the thread that started a search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stop and ponder flags.
///
/// Cloning shares the flags, so the caller keeps one handle and the search
/// another. Everything else about a search is fixed before it starts.
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    pondering: Arc<AtomicBool>,
}

impl SearchControl {
    pub fn new() -> SearchControl {
        SearchControl::default()
    }

    /// Ask the search to finish as soon as possible.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Arm both flags for a new search.
    pub fn reset(&self, pondering: bool) {
        self.stopped.store(false, Ordering::Release);
        self.pondering.store(pondering, Ordering::Release);
    }

    /// The opponent played the pondered move: start the clock.
    pub fn ponder_hit(&self) {
        self.pondering.store(false, Ordering::Release);
    }

    pub fn is_pondering(&self) -> bool {
        self.pondering.load(Ordering::Acquire)
    }
}
