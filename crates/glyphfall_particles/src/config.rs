//! Engine configuration.
//!
//! [`EngineConfig`] is the fully-resolved set of tunables the engine runs
//! with. Hosts never build one field by field; they hand over a
//! [`ConfigPatch`] whose unset fields keep their current value, either in code
//! or from a TOML file:
//!
//! ```toml
//! spawn_rate = 2.0
//! max_particles = 40
//! sort_by_depth = true
//!
//! [palette.left]
//! l = 0.22
//! c = 0.06
//! h = 265.0
//!
//! [palette.right]
//! l = 0.28
//! c = 0.09
//! h = 305.0
//! ```

use std::path::Path;

use glyphfall_core::Gradient;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Share of `max_particles` spawned before the first frame, in percent.
pub const INITIAL_POPULATION_PERCENT: usize = 40;

/// Resolved engine tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// New particles per second. Zero or negative never spawns.
    pub spawn_rate: f32,
    /// Hard cap on live particles. Zero never spawns.
    pub max_particles: usize,
    /// Multiplier on drift amplitude, baked into each particle at spawn.
    pub drift_intensity: f32,
    /// Multiplier on depth progression, baked into each particle at spawn.
    pub depth_speed: f32,
    /// Paint farthest-first by sorting on depth before each render.
    ///
    /// Off by default: particles paint in spawn order.
    pub sort_by_depth: bool,
    /// Glyph size in CSS pixels at scale 1.0.
    pub font_size: f32,
    /// Background gradient particles take their color from.
    pub palette: Gradient,
    /// RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spawn_rate: 1.5,
            max_particles: 30,
            drift_intensity: 1.0,
            depth_speed: 1.0,
            sort_by_depth: false,
            font_size: 24.0,
            palette: Gradient::NIGHT,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Resolves a patch over the defaults.
    #[must_use]
    pub fn from_patch(patch: &ConfigPatch) -> Self {
        let mut config = Self::default();
        config.apply(patch);
        config
    }

    /// Merges every set field of `patch` into this config.
    pub fn apply(&mut self, patch: &ConfigPatch) {
        if let Some(v) = patch.spawn_rate {
            self.spawn_rate = v;
        }
        if let Some(v) = patch.max_particles {
            self.max_particles = v;
        }
        if let Some(v) = patch.drift_intensity {
            self.drift_intensity = v;
        }
        if let Some(v) = patch.depth_speed {
            self.depth_speed = v;
        }
        if let Some(v) = patch.sort_by_depth {
            self.sort_by_depth = v;
        }
        if let Some(v) = patch.font_size {
            self.font_size = v;
        }
        if let Some(v) = patch.palette {
            self.palette = v;
        }
        if patch.seed.is_some() {
            self.seed = patch.seed;
        }
    }

    /// Milliseconds between spawns before jitter.
    ///
    /// Infinite when the spawn rate cannot produce a particle.
    #[must_use]
    pub fn spawn_interval_ms(&self) -> f32 {
        if self.spawn_rate.is_finite() && self.spawn_rate > 0.0 {
            1000.0 / self.spawn_rate
        } else {
            f32::INFINITY
        }
    }

    /// Particles spawned at construction so the first frame is not empty.
    #[must_use]
    pub const fn initial_population(&self) -> usize {
        self.max_particles.saturating_mul(INITIAL_POPULATION_PERCENT) / 100
    }
}

/// A partial configuration. Unset fields leave the target untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigPatch {
    /// See [`EngineConfig::spawn_rate`].
    pub spawn_rate: Option<f32>,
    /// See [`EngineConfig::max_particles`].
    pub max_particles: Option<usize>,
    /// See [`EngineConfig::drift_intensity`].
    pub drift_intensity: Option<f32>,
    /// See [`EngineConfig::depth_speed`].
    pub depth_speed: Option<f32>,
    /// See [`EngineConfig::sort_by_depth`].
    pub sort_by_depth: Option<bool>,
    /// See [`EngineConfig::font_size`].
    pub font_size: Option<f32>,
    /// See [`EngineConfig::palette`].
    pub palette: Option<Gradient>,
    /// See [`EngineConfig::seed`].
    pub seed: Option<u64>,
}

impl ConfigPatch {
    /// An empty patch (all defaults).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a patch from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigParse`] on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a patch from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigIo`] if the file cannot be read and
    /// [`EngineError::ConfigParse`] if it is not a valid patch.
    pub fn from_toml_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Self::from_toml_str(&text)
    }

    /// Sets the spawn rate.
    #[must_use]
    pub fn spawn_rate(mut self, per_second: f32) -> Self {
        self.spawn_rate = Some(per_second);
        self
    }

    /// Sets the particle cap.
    #[must_use]
    pub fn max_particles(mut self, max: usize) -> Self {
        self.max_particles = Some(max);
        self
    }

    /// Sets the drift intensity.
    #[must_use]
    pub fn drift_intensity(mut self, intensity: f32) -> Self {
        self.drift_intensity = Some(intensity);
        self
    }

    /// Sets the depth speed multiplier.
    #[must_use]
    pub fn depth_speed(mut self, speed: f32) -> Self {
        self.depth_speed = Some(speed);
        self
    }

    /// Enables or disables depth-sorted painting.
    #[must_use]
    pub fn sort_by_depth(mut self, sort: bool) -> Self {
        self.sort_by_depth = Some(sort);
        self
    }

    /// Sets the base glyph size.
    #[must_use]
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Sets the background palette.
    #[must_use]
    pub fn palette(mut self, palette: Gradient) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Seeds the RNG for reproducible runs.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphfall_core::Oklch;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!((config.spawn_rate - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.max_particles, 30);
        assert_eq!(config.initial_population(), 12);
        assert!((config.spawn_interval_ms() - 666.666_7).abs() < 0.01);
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut config = EngineConfig::default();
        config.apply(&ConfigPatch::new().max_particles(5).spawn_rate(10.0));

        assert_eq!(config.max_particles, 5);
        assert!((config.spawn_interval_ms() - 100.0).abs() < f32::EPSILON);
        assert!((config.depth_speed - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.initial_population(), 2);
    }

    #[test]
    fn test_non_positive_rate_never_spawns() {
        for rate in [0.0, -3.0, f32::NAN] {
            let config = EngineConfig::from_patch(&ConfigPatch::new().spawn_rate(rate));
            assert!(config.spawn_interval_ms().is_infinite());
        }
    }

    #[test]
    fn test_toml_patch() {
        let patch = ConfigPatch::from_toml_str(
            r#"
            spawn_rate = 2.0
            max_particles = 40
            sort_by_depth = true

            [palette.left]
            l = 0.3
            c = 0.1
            h = 200.0

            [palette.right]
            l = 0.4
            c = 0.1
            h = 220.0
            "#,
        )
        .unwrap();

        let config = EngineConfig::from_patch(&patch);
        assert_eq!(config.max_particles, 40);
        assert!(config.sort_by_depth);
        assert_eq!(config.palette.left, Oklch::new(0.3, 0.1, 200.0));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        let err = ConfigPatch::from_toml_str("spawn_rte = 2.0").unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigPatch::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, EngineError::ConfigIo { .. }));
    }
}
