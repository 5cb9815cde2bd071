//! Frame statistics.

/// Length of the FPS sampling window.
pub const FPS_WINDOW_MS: f64 = 1000.0;

/// Counts frames over a rolling window and reports frames per second.
///
/// Fed with frame timestamps, not deltas, so it stays honest when frames are
/// clamped or scaled downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpsMeter {
    window_start: Option<f64>,
    frames: u32,
    fps: f32,
}

impl FpsMeter {
    /// Creates an empty meter (reports 0 FPS).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            window_start: None,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Records a frame presented at `now_ms`.
    pub fn record_frame(&mut self, now_ms: f64) {
        let Some(start) = self.window_start else {
            self.window_start = Some(now_ms);
            return;
        };

        self.frames += 1;
        let elapsed = now_ms - start;
        if elapsed >= FPS_WINDOW_MS {
            self.fps = (f64::from(self.frames) * 1000.0 / elapsed) as f32;
            self.frames = 0;
            self.window_start = Some(now_ms);
        }
    }

    /// Forgets the current window (call when the loop pauses).
    pub fn reset(&mut self) {
        self.window_start = None;
        self.frames = 0;
    }

    /// Returns the FPS measured over the last complete window.
    #[inline]
    #[must_use]
    pub const fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixty_fps() {
        let mut meter = FpsMeter::new();
        let frame = 1000.0 / 60.0;

        for i in 0..=61 {
            meter.record_frame(f64::from(i) * frame);
        }

        assert!((meter.fps() - 60.0).abs() < 0.5, "fps = {}", meter.fps());
    }

    #[test]
    fn test_reset_keeps_last_reading() {
        let mut meter = FpsMeter::new();
        for i in 0..=30 {
            meter.record_frame(f64::from(i) * 40.0);
        }
        let before = meter.fps();
        assert!(before > 0.0);

        meter.reset();
        meter.record_frame(10_000.0);
        assert!((meter.fps() - before).abs() < f32::EPSILON);
    }
}
