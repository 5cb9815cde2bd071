//! # Glyph Particle
//!
//! One digit or currency symbol drifting toward the viewer.
//!
//! Depth is the only clock that matters for visuals:
//!
//! ```text
//! depth   0.0 ──────── 0.15 ──────────────────── 0.75 ──────── 1.0
//! opacity 0 ─ fade in ─ 0.35 ──── main range ──── 1.0 ─ dissolve ─ 0
//! scale   0.3× ────────────────── linear ─────────────────────── 2.0×
//! blur    4px ─────────────────── linear ─────────────────────── 0px
//! ```
//!
//! Age only drives the drift and the hue wobble. Once depth reaches 1.0 the
//! particle is dead and never changes again.

use glyphfall_core::{Gradient, Oklch};
use rand::Rng;

use crate::config::EngineConfig;
use crate::surface::GlyphInstance;

/// Depth gained per millisecond at `depth_speed = 1` (full range in ~5 s).
pub const DEPTH_PER_MS: f32 = 1.0 / 5000.0;
/// Rotation speeds are in radians per second; deltas arrive in milliseconds.
pub const ROTATION_PER_MS: f32 = 0.001;
/// Drift swing in CSS pixels at depth 0 and intensity 1.
pub const DRIFT_AMPLITUDE: f32 = 18.0;
/// Glyphs fainter than this are not drawn at all.
pub const MIN_VISIBLE_OPACITY: f32 = 0.01;
/// Blur at depth 0, in CSS pixels.
pub const MAX_BLUR: f32 = 4.0;

/// Newly spawned particles start somewhere in `[0, SPAWN_DEPTH_MAX]`.
pub const SPAWN_DEPTH_MAX: f32 = 0.2;
/// Chance that a spawned glyph is a digit rather than a currency symbol.
pub const DIGIT_PROBABILITY: f64 = 0.6;
/// Currency glyphs.
pub const CURRENCY_GLYPHS: [char; 5] = ['$', '€', '£', '¥', '₿'];

const DEPTH_SPEED_BAND: (f32, f32) = (0.5, 1.0);
const DRIFT_FREQUENCY_BAND: (f32, f32) = (0.0004, 0.0012);
const ROTATION_SPEED_BAND: (f32, f32) = (0.2, 1.0);

const FADE_IN_END: f32 = 0.15;
const DISSOLVE_START: f32 = 0.75;
const FADE_IN_OPACITY: f32 = 0.35;

/// Below this depth particles contrast only subtly with the background.
const STRONG_CONTRAST_DEPTH: f32 = 0.3;
/// (lightness, chroma) offsets over the background color.
const SUBTLE_CONTRAST: (f32, f32) = (0.12, 0.03);
const STRONG_CONTRAST: (f32, f32) = (0.35, 0.08);
/// Peak hue wobble in degrees.
const HUE_WOBBLE_DEGREES: f32 = 12.0;

/// Perspective scale at `depth`: 0.3× far away, 2.0× at the viewer.
#[inline]
#[must_use]
pub fn scale_at(depth: f32) -> f32 {
    0.3 + depth * 1.7
}

/// Opacity at `depth`. Continuous at both breakpoints.
#[must_use]
pub fn opacity_at(depth: f32) -> f32 {
    let opacity = if depth < FADE_IN_END {
        depth / FADE_IN_END * FADE_IN_OPACITY
    } else if depth < DISSOLVE_START {
        let t = (depth - FADE_IN_END) / (DISSOLVE_START - FADE_IN_END);
        FADE_IN_OPACITY + t * (1.0 - FADE_IN_OPACITY)
    } else {
        (1.0 - depth) / (1.0 - DISSOLVE_START)
    };
    opacity.clamp(0.0, 1.0)
}

/// Atmospheric blur at `depth`, in CSS pixels.
#[inline]
#[must_use]
pub fn blur_at(depth: f32) -> f32 {
    (MAX_BLUR - depth * MAX_BLUR).max(0.0)
}

/// Everything decided at spawn time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    /// Anchor as a fraction of the surface, each axis in `[0, 1]`.
    pub anchor: [f32; 2],
    /// Starting depth.
    pub depth: f32,
    /// Depth rate multiplier (engine `depth_speed` already folded in).
    pub depth_speed: f32,
    /// Drift frequencies in radians per millisecond of age.
    pub drift: [f32; 2],
    /// Drift swing in CSS pixels at depth 0 (engine `drift_intensity` folded in).
    pub drift_amplitude: f32,
    /// The glyph.
    pub glyph: char,
    /// Starting rotation in radians.
    pub rotation: f32,
    /// Angular velocity in radians per second.
    pub rotation_speed: f32,
}

impl SpawnParams {
    /// Rolls a new particle using the engine's current tunables.
    #[must_use]
    pub fn random<R: Rng + ?Sized>(rng: &mut R, config: &EngineConfig) -> Self {
        let glyph = if rng.gen_bool(DIGIT_PROBABILITY) {
            char::from(b'0' + rng.gen_range(0..10u8))
        } else {
            CURRENCY_GLYPHS[rng.gen_range(0..CURRENCY_GLYPHS.len())]
        };

        let spin = rng.gen_range(ROTATION_SPEED_BAND.0..ROTATION_SPEED_BAND.1);
        let rotation_speed = if rng.gen_bool(0.5) { spin } else { -spin };

        Self {
            anchor: [rng.gen::<f32>(), rng.gen::<f32>()],
            depth: rng.gen_range(0.0..=SPAWN_DEPTH_MAX),
            depth_speed: rng.gen_range(DEPTH_SPEED_BAND.0..DEPTH_SPEED_BAND.1) * config.depth_speed,
            drift: [
                rng.gen_range(DRIFT_FREQUENCY_BAND.0..DRIFT_FREQUENCY_BAND.1),
                rng.gen_range(DRIFT_FREQUENCY_BAND.0..DRIFT_FREQUENCY_BAND.1),
            ],
            drift_amplitude: DRIFT_AMPLITUDE * config.drift_intensity,
            glyph,
            rotation: rng.gen_range(-0.3..0.3),
            rotation_speed,
        }
    }
}

/// A single drifting glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    position: [f32; 2],
    anchor: [f32; 2],
    bounds: [f32; 2],
    depth: f32,
    depth_speed: f32,
    drift: [f32; 2],
    drift_amplitude: f32,
    glyph: char,
    rotation: f32,
    rotation_speed: f32,
    age: f32,
    dead: bool,
}

impl Particle {
    /// Creates a particle on a `bounds`-sized surface (CSS pixels).
    #[must_use]
    pub fn new(params: SpawnParams, bounds: [f32; 2]) -> Self {
        let depth = sanitize(params.depth).clamp(0.0, 1.0);
        let mut particle = Self {
            position: [0.0; 2],
            anchor: [
                sanitize(params.anchor[0]).clamp(0.0, 1.0),
                sanitize(params.anchor[1]).clamp(0.0, 1.0),
            ],
            bounds: [sanitize(bounds[0]).max(0.0), sanitize(bounds[1]).max(0.0)],
            depth,
            // Negative speeds would walk depth backwards
            depth_speed: sanitize(params.depth_speed).max(0.0),
            drift: params.drift,
            drift_amplitude: sanitize(params.drift_amplitude),
            glyph: params.glyph,
            rotation: params.rotation,
            rotation_speed: params.rotation_speed,
            age: 0.0,
            dead: depth >= 1.0,
        };
        particle.reposition();
        particle
    }

    /// Advances the particle by `delta_ms`.
    ///
    /// Callers clamp large gaps; the engine clamps to 100 ms per frame.
    pub fn update(&mut self, delta_ms: f32) {
        if self.dead {
            return;
        }
        let delta = sanitize(delta_ms).max(0.0);

        self.age += delta;
        self.depth = (self.depth + self.depth_speed * delta * DEPTH_PER_MS).min(1.0);
        self.rotation += self.rotation_speed * delta * ROTATION_PER_MS;
        self.reposition();

        if self.depth >= 1.0 {
            self.dead = true;
        }
    }

    /// Re-anchors on a resized surface, keeping the relative placement.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = [sanitize(width).max(0.0), sanitize(height).max(0.0)];
        self.reposition();
    }

    /// True once the particle reached the viewer.
    #[inline]
    #[must_use]
    pub const fn should_remove(&self) -> bool {
        self.dead
    }

    fn reposition(&mut self) {
        let swing = self.drift_amplitude * (1.0 + self.depth);
        let [bx, by] = self.base_position();
        self.position = [
            bx + (self.age * self.drift[0]).sin() * swing,
            by + (self.age * self.drift[1]).cos() * swing,
        ];
    }

    // ========================================================================
    // DERIVED VISUALS
    // ========================================================================

    /// Perspective scale.
    #[inline]
    #[must_use]
    pub fn scale(&self) -> f32 {
        scale_at(self.depth)
    }

    /// Opacity.
    #[inline]
    #[must_use]
    pub fn opacity(&self) -> f32 {
        opacity_at(self.depth)
    }

    /// Blur radius in CSS pixels.
    #[inline]
    #[must_use]
    pub fn blur(&self) -> f32 {
        blur_at(self.depth)
    }

    /// Glyph color in OKLCH.
    ///
    /// Taken from the background gradient under the particle, then lifted:
    /// subtly while far away, strongly once past depth 0.3. A slow `sin(age)`
    /// hue wobble keeps neighbouring glyphs from looking identical.
    #[must_use]
    pub fn color(&self, palette: &Gradient) -> Oklch {
        let t = if self.bounds[0] > 0.0 {
            (self.position[0] / self.bounds[0]).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let (dl, dc) = if self.depth < STRONG_CONTRAST_DEPTH {
            SUBTLE_CONTRAST
        } else {
            STRONG_CONTRAST
        };
        let wobble = (self.age * 0.001).sin() * HUE_WOBBLE_DEGREES;

        palette.sample(t).lighten(dl).saturate(dc).rotate_hue(wobble)
    }

    /// Builds the draw instruction, or `None` if nothing would be visible.
    #[must_use]
    pub fn instance(&self, palette: &Gradient, font_size: f32) -> Option<GlyphInstance> {
        if self.dead {
            return None;
        }
        let alpha = self.opacity();
        if alpha < MIN_VISIBLE_OPACITY {
            return None;
        }

        let [r, g, b] = self.color(palette).to_srgb().to_array();
        Some(GlyphInstance {
            position: self.position,
            rotation: self.rotation,
            font_size: font_size * self.scale(),
            color: [r, g, b, alpha],
            blur: self.blur(),
            depth: self.depth,
            glyph: u32::from(self.glyph),
            reserved: 0,
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Current draw position in CSS pixels.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Anchor point in CSS pixels (position without drift).
    #[inline]
    #[must_use]
    pub fn base_position(&self) -> [f32; 2] {
        [self.anchor[0] * self.bounds[0], self.anchor[1] * self.bounds[1]]
    }

    /// Anchor as a fraction of the surface.
    #[inline]
    #[must_use]
    pub const fn relative_position(&self) -> [f32; 2] {
        self.anchor
    }

    /// Depth in `[0, 1]`.
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> f32 {
        self.depth
    }

    /// Milliseconds since spawn.
    #[inline]
    #[must_use]
    pub const fn age(&self) -> f32 {
        self.age
    }

    /// Accumulated rotation in radians (unwrapped).
    #[inline]
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// The glyph.
    #[inline]
    #[must_use]
    pub const fn glyph(&self) -> char {
        self.glyph
    }
}

/// Maps NaN and infinities to zero.
#[inline]
fn sanitize(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(depth: f32) -> SpawnParams {
        SpawnParams {
            anchor: [0.5, 0.5],
            depth,
            depth_speed: 1.0,
            drift: [0.001, 0.001],
            drift_amplitude: DRIFT_AMPLITUDE,
            glyph: '7',
            rotation: 0.0,
            rotation_speed: 0.5,
        }
    }

    #[test]
    fn test_opacity_continuous_at_breakpoints() {
        let eps = 1e-4;
        assert!((opacity_at(FADE_IN_END - eps) - 0.35).abs() < 1e-3);
        assert!((opacity_at(FADE_IN_END) - 0.35).abs() < 1e-6);
        assert!((opacity_at(DISSOLVE_START - eps) - 1.0).abs() < 1e-3);
        assert!((opacity_at(DISSOLVE_START) - 1.0).abs() < 1e-6);
        assert!(opacity_at(0.0).abs() < f32::EPSILON);
        assert!(opacity_at(1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_scale_and_blur_range() {
        assert!((scale_at(0.0) - 0.3).abs() < f32::EPSILON);
        assert!((scale_at(1.0) - 2.0).abs() < 1e-6);
        assert!((blur_at(0.0) - 4.0).abs() < f32::EPSILON);
        assert!(blur_at(1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_depth_monotonic_until_death() {
        let mut p = Particle::new(params(0.0), [400.0, 300.0]);
        let mut last = p.depth();
        let mut deaths = 0;

        for _ in 0..1000 {
            let was_dead = p.should_remove();
            p.update(16.0);
            assert!(p.depth() >= last);
            last = p.depth();
            if p.should_remove() && !was_dead {
                deaths += 1;
            }
        }

        assert_eq!(deaths, 1);
        assert!((p.depth() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dead_particle_is_frozen() {
        let mut p = Particle::new(params(0.95), [100.0, 100.0]);
        p.update(500.0);
        assert!(p.should_remove());

        let snapshot = p.clone();
        p.update(16.0);
        assert_eq!(p, snapshot);
        assert!(p.instance(&Gradient::NIGHT, 24.0).is_none());
    }

    #[test]
    fn test_full_range_in_five_seconds() {
        let mut p = Particle::new(params(0.0), [100.0, 100.0]);
        for _ in 0..49 {
            p.update(100.0);
        }
        assert!(!p.should_remove());
        p.update(100.0);
        p.update(100.0);
        assert!(p.should_remove());
    }

    #[test]
    fn test_drift_grows_with_depth() {
        let near = Particle::new(params(0.9), [100.0, 100.0]);
        let far = Particle::new(params(0.0), [100.0, 100.0]);
        // At age 0 the whole swing is on the Y axis
        let near_dy = near.position()[1] - near.base_position()[1];
        let far_dy = far.position()[1] - far.base_position()[1];
        assert!((far_dy - DRIFT_AMPLITUDE).abs() < 1e-4);
        assert!((near_dy - DRIFT_AMPLITUDE * 1.9).abs() < 1e-4);
    }

    #[test]
    fn test_resize_keeps_relative_position() {
        let mut p = Particle::new(params(0.1), [200.0, 100.0]);
        assert_eq!(p.base_position(), [100.0, 50.0]);

        p.resize(1000.0, 40.0);
        assert_eq!(p.base_position(), [500.0, 20.0]);

        p.resize(0.0, 0.0);
        assert_eq!(p.base_position(), [0.0, 0.0]);

        p.resize(300.0, 300.0);
        assert_eq!(p.relative_position(), [0.5, 0.5]);
        assert_eq!(p.base_position(), [150.0, 150.0]);
    }

    #[test]
    fn test_far_particles_are_skipped() {
        let p = Particle::new(params(0.0), [100.0, 100.0]);
        assert!(p.instance(&Gradient::NIGHT, 24.0).is_none());

        let p = Particle::new(params(0.4), [100.0, 100.0]);
        let inst = p.instance(&Gradient::NIGHT, 24.0).unwrap();
        assert_eq!(inst.glyph_char(), Some('7'));
        assert!((inst.font_size - 24.0 * scale_at(0.4)).abs() < 1e-4);
    }

    #[test]
    fn test_color_contrast_tiers() {
        let subtle = Particle::new(params(0.2), [100.0, 100.0]).color(&Gradient::NIGHT);
        let strong = Particle::new(params(0.5), [100.0, 100.0]).color(&Gradient::NIGHT);
        let background = Gradient::NIGHT.sample(0.5);

        assert!(subtle.l > background.l);
        assert!(strong.l > subtle.l);
        assert!(strong.c > subtle.c);
    }

    #[test]
    fn test_drift_intensity_scales_amplitude() {
        let calm = EngineConfig::default();
        let wild = EngineConfig {
            drift_intensity: 2.0,
            ..EngineConfig::default()
        };
        let a = SpawnParams::random(&mut ChaCha8Rng::seed_from_u64(8), &calm);
        let b = SpawnParams::random(&mut ChaCha8Rng::seed_from_u64(8), &wild);
        assert!((b.drift_amplitude - 2.0 * DRIFT_AMPLITUDE).abs() < f32::EPSILON);

        let mut pa = Particle::new(a, [400.0, 400.0]);
        let mut pb = Particle::new(b, [400.0, 400.0]);
        pa.update(700.0);
        pb.update(700.0);

        for axis in 0..2 {
            let offset_a = pa.position()[axis] - pa.base_position()[axis];
            let offset_b = pb.position()[axis] - pb.base_position()[axis];
            assert!((offset_b - 2.0 * offset_a).abs() < 1e-3, "axis {axis}");
        }
    }

    #[test]
    fn test_random_params_within_bands() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = EngineConfig::default();
        let mut digits = 0;

        for _ in 0..2000 {
            let p = SpawnParams::random(&mut rng, &config);
            assert!((0.0..=SPAWN_DEPTH_MAX).contains(&p.depth));
            assert!((0.0..=1.0).contains(&p.anchor[0]));
            assert!(p.depth_speed >= 0.5 && p.depth_speed < 1.0);
            assert!(p.rotation_speed.abs() >= 0.2);
            if p.glyph.is_ascii_digit() {
                digits += 1;
            } else {
                assert!(CURRENCY_GLYPHS.contains(&p.glyph));
            }
        }

        // 60% digits, give or take
        assert!((1080..1320).contains(&digits), "digits = {digits}");
    }
}
