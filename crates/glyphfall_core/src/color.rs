//! # OKLCH Color Math
//!
//! Perceptual color handling for the glyph field.
//!
//! Particles pick their color from the background gradient and then push it
//! lighter and more saturated, so all interpolation happens in OKLCH where
//! "lighter" and "more chroma" mean what they say. Conversion to sRGB only
//! happens at the very end, right before a draw instruction is emitted.
//!
//! ```text
//! OKLCH ──polar→cartesian──▶ OKLab ──LMS cube──▶ linear sRGB ──gamma──▶ sRGB
//! ```

use serde::{Deserialize, Serialize};

/// A color in OKLCH space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oklch {
    /// Perceptual lightness (0 = black, 1 = white).
    pub l: f32,
    /// Chroma (0 = gray, ~0.37 = most saturated sRGB colors).
    pub c: f32,
    /// Hue angle in degrees.
    pub h: f32,
}

impl Oklch {
    /// Creates a new OKLCH color.
    #[inline]
    #[must_use]
    pub const fn new(l: f32, c: f32, h: f32) -> Self {
        Self { l, c, h }
    }

    /// Returns a copy shifted lighter by `amount`, clamped to white.
    #[inline]
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        Self {
            l: (self.l + amount).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Returns a copy with chroma raised by `amount`, never below gray.
    #[inline]
    #[must_use]
    pub fn saturate(self, amount: f32) -> Self {
        Self {
            c: (self.c + amount).max(0.0),
            ..self
        }
    }

    /// Returns a copy with the hue rotated by `degrees`.
    #[inline]
    #[must_use]
    pub fn rotate_hue(self, degrees: f32) -> Self {
        Self {
            h: (self.h + degrees).rem_euclid(360.0),
            ..self
        }
    }

    /// Interpolates toward `other`.
    ///
    /// Hue takes the shortest way around the color wheel, so 350° → 10°
    /// passes through 0° instead of sweeping through green.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut dh = (other.h - self.h).rem_euclid(360.0);
        if dh > 180.0 {
            dh -= 360.0;
        }

        Self {
            l: self.l + (other.l - self.l) * t,
            c: self.c + (other.c - self.c) * t,
            h: (self.h + dh * t).rem_euclid(360.0),
        }
    }

    /// Converts to OKLab `(L, a, b)`.
    #[must_use]
    pub fn to_oklab(self) -> [f32; 3] {
        let (sin, cos) = self.h.to_radians().sin_cos();
        [self.l, self.c * cos, self.c * sin]
    }

    /// Converts to gamma-encoded sRGB, gamut-clipped to `[0, 1]`.
    #[must_use]
    pub fn to_srgb(self) -> Rgb {
        let [l, a, b] = self.to_oklab();

        let l_ = l + 0.396_337_78 * a + 0.215_803_76 * b;
        let m_ = l - 0.105_561_35 * a - 0.063_854_17 * b;
        let s_ = l - 0.089_484_18 * a - 1.291_485_5 * b;

        let l3 = l_ * l_ * l_;
        let m3 = m_ * m_ * m_;
        let s3 = s_ * s_ * s_;

        let r = 4.076_741_7 * l3 - 3.307_711_6 * m3 + 0.230_969_94 * s3;
        let g = -1.268_438 * l3 + 2.609_757_4 * m3 - 0.341_319_4 * s3;
        let bl = -0.004_196_086_3 * l3 - 0.703_418_6 * m3 + 1.707_614_7 * s3;

        Rgb::new(gamma_encode(r), gamma_encode(g), gamma_encode(bl))
    }
}

/// sRGB transfer function, with clipping.
#[inline]
fn gamma_encode(linear: f32) -> f32 {
    let v = if linear <= 0.003_130_8 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    v.clamp(0.0, 1.0)
}

/// Gamma-encoded sRGB color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
}

impl Rgb {
    /// Creates a new color.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Returns the components as an array.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Returns 8-bit channel values.
    #[must_use]
    pub fn to_u8(self) -> [u8; 3] {
        // Channels are clamped, so the cast cannot wrap.
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Formats as a CSS `rgba()` string.
    #[must_use]
    pub fn to_css(self, alpha: f32) -> String {
        let [r, g, b] = self.to_u8();
        format!("rgba({r}, {g}, {b}, {:.3})", alpha.clamp(0.0, 1.0))
    }
}

/// Two-stop horizontal gradient, left edge to right edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    /// Color at the left edge (`t = 0`).
    pub left: Oklch,
    /// Color at the right edge (`t = 1`).
    pub right: Oklch,
}

impl Gradient {
    /// Deep indigo on the left drifting to violet on the right.
    pub const NIGHT: Self = Self {
        left: Oklch::new(0.22, 0.06, 265.0),
        right: Oklch::new(0.28, 0.09, 305.0),
    };

    /// Creates a new gradient.
    #[must_use]
    pub const fn new(left: Oklch, right: Oklch) -> Self {
        Self { left, right }
    }

    /// Samples the gradient at normalized position `t`.
    #[inline]
    #[must_use]
    pub fn sample(&self, t: f32) -> Oklch {
        self.left.lerp(self.right, t)
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self::NIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_white_and_black() {
        let white = Oklch::new(1.0, 0.0, 0.0).to_srgb();
        assert!(close(white.r, 1.0) && close(white.g, 1.0) && close(white.b, 1.0), "{white:?}");

        let black = Oklch::new(0.0, 0.0, 0.0).to_srgb();
        assert_eq!(black.to_u8(), [0, 0, 0]);
    }

    #[test]
    fn test_known_red() {
        // sRGB #ff0000 is roughly oklch(0.628 0.258 29.2)
        let red = Oklch::new(0.628, 0.258, 29.23).to_srgb();
        let [r, g, b] = red.to_u8();
        assert!(r >= 250, "red channel too low: {r}");
        assert!(g <= 8 && b <= 8, "expected pure red, got {g} {b}");
    }

    #[test]
    fn test_hue_takes_short_path() {
        let a = Oklch::new(0.5, 0.1, 350.0);
        let b = Oklch::new(0.5, 0.1, 10.0);
        let mid = a.lerp(b, 0.5);
        assert!(mid.h < 1.0 || mid.h > 359.0, "hue went the long way: {}", mid.h);
    }

    #[test]
    fn test_gradient_endpoints() {
        let g = Gradient::NIGHT;
        assert_eq!(g.sample(0.0), g.left);
        assert!(close(g.sample(1.0).h, g.right.h));
        // Out-of-range positions clamp
        assert_eq!(g.sample(-3.0), g.left);
    }

    #[test]
    fn test_lighten_saturate_clamp() {
        let c = Oklch::new(0.9, 0.02, 120.0).lighten(0.5).saturate(-1.0);
        assert!(close(c.l, 1.0));
        assert!(close(c.c, 0.0));
        assert!(close(Oklch::new(0.5, 0.1, 355.0).rotate_hue(10.0).h, 5.0));
    }

    #[test]
    fn test_css_format() {
        let css = Rgb::new(1.0, 0.0, 0.5).to_css(0.5);
        assert_eq!(css, "rgba(255, 0, 128, 0.500)");
    }
}
