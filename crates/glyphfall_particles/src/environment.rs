//! Host environment inputs.

/// Delta-time multiplier applied when the host asks for reduced motion.
pub const REDUCED_MOTION_SCALE: f32 = 0.3;

/// What the engine reads from its host besides the surface itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostEnvironment {
    /// Device pixels per CSS pixel.
    pub device_pixel_ratio: f32,
    /// The user prefers less motion (accessibility setting).
    ///
    /// Honored by slowing everything down, not by disabling the animation.
    pub prefers_reduced_motion: bool,
}

impl HostEnvironment {
    /// Creates an environment description.
    #[must_use]
    pub const fn new(device_pixel_ratio: f32, prefers_reduced_motion: bool) -> Self {
        Self {
            device_pixel_ratio,
            prefers_reduced_motion,
        }
    }

    /// Device pixel ratio, falling back to 1.0 for nonsense values.
    #[inline]
    #[must_use]
    pub fn pixel_ratio(&self) -> f32 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Multiplier for frame deltas.
    #[inline]
    #[must_use]
    pub const fn motion_scale(&self) -> f32 {
        if self.prefers_reduced_motion {
            REDUCED_MOTION_SCALE
        } else {
            1.0
        }
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::new(1.0, false)
    }
}
