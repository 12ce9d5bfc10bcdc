// src/exchange.rs
use std::sync::{Arc, Mutex};

/// Single-slot handoff between a frame acquisition thread and the pipeline.
///
/// The producer overwrites whatever is in the slot, the consumer takes
/// ownership and clears it. At most one frame is ever in flight, the
/// consumer always sees the newest frame and stale frames are dropped
/// silently.
pub struct FrameExchange<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> FrameExchange<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Publishes the newest frame, replacing any unconsumed one.
    pub fn publish(&self, frame: T) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(frame);
        }
    }

    /// Takes the newest frame out of the slot, leaving it empty.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl<T> Clone for FrameExchange<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for FrameExchange<T> {
    fn default() -> Self {
        Self::new()
    }
}
