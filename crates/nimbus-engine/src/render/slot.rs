use std::sync::{Arc, Mutex, PoisonError};

use super::Frame;

/// Single-slot handoff between the render worker and a display.
///
/// Publishing replaces whatever frame was there; readers always see the most
/// recent completed frame and never wait on the device.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    inner: Arc<Mutex<Option<Arc<Frame>>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current frame.
    pub fn publish(&self, frame: Frame) {
        let frame = Arc::new(frame);
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
    }

    /// Most recently published frame, if any.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
