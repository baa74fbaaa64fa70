//! Frame generations for cooperative cancellation.
//!
//! Starting a frame takes a [`FrameTicket`] from the shared
//! [`FrameCounter`]. Any later `begin` or `invalidate` makes older tickets
//! stale, and workers holding them stop at the next check.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::renderer::RenderError;

/// Monotonically increasing frame generation, shared between threads.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    generation: Arc<AtomicU64>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame, superseding every outstanding ticket.
    pub fn begin(&self) -> FrameTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        FrameTicket {
            generation,
            counter: self.clone(),
        }
    }

    /// Supersede outstanding tickets without starting a frame.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// The generation a frame was dispatched with.
#[derive(Debug, Clone)]
pub struct FrameTicket {
    generation: u64,
    counter: FrameCounter,
}

impl FrameTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.counter.current() == self.generation
    }

    /// `Err(RenderError::Superseded)` once a newer frame has begun.
    pub fn check(&self) -> Result<(), RenderError> {
        let current = self.counter.current();
        if current == self.generation {
            Ok(())
        } else {
            Err(RenderError::Superseded {
                generation: self.generation,
                current,
            })
        }
    }
}
