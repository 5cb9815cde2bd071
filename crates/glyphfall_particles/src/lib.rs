//! # GLYPHFALL Particles
//!
//! Currency symbols and digits drifting toward the viewer.
//!
//! ## Model
//!
//! Every glyph carries a depth in `[0, 1]`: 0 is the far plane, 1 is the
//! viewer. Depth only grows. Scale, opacity, blur and color contrast are pure
//! functions of depth, so a glyph fades in from the distance, sharpens
//! mid-field, then swells, blurs and fades out as it passes the camera.
//!
//! ## Layout
//!
//! - [`particle`]: one glyph and its depth curves
//! - [`engine`]: population, spawn cadence, frame body
//! - [`frame_loop`]: chains frames through a [`glyphfall_core::FrameScheduler`]
//! - [`surface`]: what the engine draws on
//! - [`config`]: tunables, partial updates, TOML loading
//! - `web` (feature `web`): canvas + `requestAnimationFrame`
//!
//! ## Example
//!
//! ```
//! use glyphfall_particles::{ConfigPatch, HostEnvironment, ParticleEngine, RecordingSurface};
//!
//! let surface = RecordingSurface::new(800.0, 600.0);
//! let patch = ConfigPatch::new().max_particles(20).seed(7);
//! let mut engine = ParticleEngine::new(surface, &patch, HostEnvironment::default()).unwrap();
//!
//! engine.start();
//! for frame in 0..60 {
//!     engine.frame(f64::from(frame) * 16.0);
//! }
//! assert!(engine.particle_count() <= 20);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod frame_loop;
pub mod particle;
pub mod surface;
#[cfg(feature = "web")]
pub mod web;

pub use config::{ConfigPatch, EngineConfig};
pub use engine::{EngineStats, FrameReport, ParticleEngine};
pub use environment::HostEnvironment;
pub use error::{EngineError, EngineResult};
pub use frame_loop::FrameLoop;
pub use particle::{Particle, SpawnParams};
pub use surface::{DrawContext, DrawSurface, GlyphInstance, RecordingContext, RecordingSurface};
#[cfg(feature = "web")]
pub use web::{AnimationFrameScheduler, CanvasContext, CanvasSurface};
