//! Host-independent frame scheduling.
//!
//! The animation loop never talks to a display-refresh API directly. It asks a
//! [`FrameScheduler`] for "one callback on the next frame" and gets back a
//! [`FrameHandle`] it can cancel. Browsers back this with
//! `requestAnimationFrame`; tests back it with [`ManualScheduler`], which only
//! fires when told to.

use std::sync::Arc;

use parking_lot::Mutex;

/// Callback invoked once with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Opaque handle to a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    /// Wraps a raw scheduler id.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw scheduler id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Schedules callbacks on the next display refresh.
pub trait FrameScheduler {
    /// Requests `callback` to run on the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Cancels a pending callback. Unknown or already-fired handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

#[derive(Default)]
struct ManualQueue {
    next_id: u64,
    now_ms: f64,
    pending: Vec<(FrameHandle, FrameCallback)>,
}

/// A scheduler driven by hand.
///
/// Nothing runs until [`ManualScheduler::advance`] is called, which moves the
/// fake clock forward and fires every callback that was pending at that
/// moment. Callbacks requested while firing wait for the next `advance`,
/// exactly like a real display loop.
///
/// Clones share the same queue and clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<ManualQueue>>,
}

impl ManualScheduler {
    /// Creates a scheduler with its clock at 0 ms.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fake clock in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.queue.lock().now_ms
    }

    /// Returns the number of callbacks waiting for a frame.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.lock().pending.len()
    }

    /// Advances the clock by `delta_ms` and fires all pending callbacks.
    ///
    /// Returns the number of callbacks fired.
    pub fn advance(&self, delta_ms: f64) -> usize {
        let (now, due) = {
            let mut queue = self.queue.lock();
            queue.now_ms += delta_ms.max(0.0);
            (queue.now_ms, std::mem::take(&mut queue.pending))
        };

        // Lock is released here: callbacks reschedule through `request_frame`.
        let fired = due.len();
        for (_, callback) in due {
            callback(now);
        }
        fired
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let mut queue = self.queue.lock();
        queue.next_id += 1;
        let handle = FrameHandle(queue.next_id);
        queue.pending.push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let mut queue = self.queue.lock();
        let before = queue.pending.len();
        queue.pending.retain(|(h, _)| *h != handle);
        if queue.pending.len() == before {
            tracing::trace!(handle = handle.raw(), "cancel for a frame that is not pending");
        }
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue.lock();
        f.debug_struct("ManualScheduler")
            .field("now_ms", &queue.now_ms)
            .field("pending", &queue.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_fires_with_advanced_timestamp() {
        let scheduler = ManualScheduler::new();
        let seen = Rc::new(Cell::new(0.0));

        let sink = Rc::clone(&seen);
        scheduler.request_frame(Box::new(move |ts| sink.set(ts)));

        assert_eq!(scheduler.advance(16.0), 1);
        assert!((seen.get() - 16.0).abs() < f64::EPSILON);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancel_prevents_callback() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(false));

        let sink = Rc::clone(&fired);
        let handle = scheduler.request_frame(Box::new(move |_| sink.set(true)));
        scheduler.cancel_frame(handle);

        assert_eq!(scheduler.advance(16.0), 0);
        assert!(!fired.get());
    }

    #[test]
    fn test_rescheduled_callback_waits_for_next_frame() {
        let scheduler = ManualScheduler::new();
        let count = Rc::new(Cell::new(0u32));

        let inner = scheduler.clone();
        let sink = Rc::clone(&count);
        scheduler.request_frame(Box::new(move |_| {
            sink.set(sink.get() + 1);
            let again = Rc::clone(&sink);
            inner.request_frame(Box::new(move |_| again.set(again.get() + 1)));
        }));

        assert_eq!(scheduler.advance(16.0), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending_count(), 1);

        assert_eq!(scheduler.advance(16.0), 1);
        assert_eq!(count.get(), 2);
        assert!((scheduler.now_ms() - 32.0).abs() < f64::EPSILON);
    }
}
