//! # Particle Engine
//!
//! Owns the glyph population and runs one frame at a time.
//!
//! ```text
//! ┌──────────────────────────── frame(now) ────────────────────────────┐
//! │ 1. delta = now - last frame, capped at 100 ms                      │
//! │ 2. delta *= 0.3 if the host prefers reduced motion                 │
//! │ 3. update every particle                                           │
//! │ 4. prune the dead                                                  │
//! │ 5. spawn while accumulated >= interval and below the cap           │
//! │    (interval re-jittered ±20% after every spawn)                   │
//! │ 6. clear the surface, draw survivors in paint order                │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine itself never schedules anything; [`crate::FrameLoop`] chains
//! frames through a scheduler. Hosts and tests may also drive
//! [`ParticleEngine::update`] and [`ParticleEngine::render`] directly.

use glyphfall_core::FpsMeter;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{ConfigPatch, EngineConfig};
use crate::environment::HostEnvironment;
use crate::error::{EngineError, EngineResult};
use crate::particle::{Particle, SpawnParams};
use crate::surface::{DrawContext, DrawSurface};

/// Longest delta a single frame may apply, in milliseconds.
pub const MAX_FRAME_DELTA_MS: f32 = 100.0;
/// Spawn interval jitter, as a fraction of the base interval.
pub const SPAWN_JITTER: f32 = 0.2;

/// Debug snapshot for the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStats {
    /// Frames per second over the last full second.
    pub fps: f32,
    /// Live particles.
    pub particle_count: usize,
    /// Whether the loop is running.
    pub is_running: bool,
    /// Frames run through [`ParticleEngine::frame`].
    pub frames_rendered: u64,
    /// Particles spawned since construction (initial batch included).
    pub spawned_total: u64,
    /// Particles retired since construction.
    pub retired_total: u64,
    /// Glyphs drawn by the last render.
    pub last_frame_drawn: usize,
}

/// What one call to [`ParticleEngine::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Delta applied to the simulation, after capping and motion scaling.
    pub delta_ms: f32,
    /// Particles spawned this frame.
    pub spawned: u64,
    /// Particles retired this frame.
    pub retired: u64,
    /// Glyphs drawn this frame.
    pub drawn: usize,
}

/// The glyph particle engine.
pub struct ParticleEngine<S: DrawSurface> {
    surface: S,
    context: S::Context,
    config: EngineConfig,
    environment: HostEnvironment,
    particles: Vec<Particle>,
    rng: ChaCha8Rng,
    spawn_interval: f32,
    spawn_accumulator: f32,
    canvas_size: [f32; 2],
    running: bool,
    last_frame_ms: Option<f64>,
    fps: FpsMeter,
    frames_rendered: u64,
    spawned_total: u64,
    retired_total: u64,
    last_frame_drawn: usize,
}

impl<S: DrawSurface> ParticleEngine<S> {
    /// Creates an engine on `surface`.
    ///
    /// Unset fields of `patch` take their defaults. 40% of `max_particles`
    /// are spawned immediately so the first frame is not empty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ContextUnavailable`] if the surface cannot
    /// provide a 2D context.
    pub fn new(mut surface: S, patch: &ConfigPatch, environment: HostEnvironment) -> EngineResult<Self> {
        let Some(context) = surface.context_2d() else {
            tracing::warn!("drawing surface has no 2D context; no animation");
            return Err(EngineError::ContextUnavailable);
        };

        let config = EngineConfig::from_patch(patch);
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let spawn_interval = jittered(config.spawn_interval_ms(), &mut rng);
        let (width, height) = surface.logical_size();

        let mut engine = Self {
            surface,
            context,
            particles: Vec::with_capacity(config.max_particles.min(1024)),
            config,
            environment,
            rng,
            spawn_interval,
            spawn_accumulator: 0.0,
            canvas_size: [clean_dimension(width), clean_dimension(height)],
            running: false,
            last_frame_ms: None,
            fps: FpsMeter::new(),
            frames_rendered: 0,
            spawned_total: 0,
            retired_total: 0,
            last_frame_drawn: 0,
        };
        engine.apply_backing_size();

        for _ in 0..engine.config.initial_population() {
            engine.spawn_particle();
        }

        if engine.config.spawn_interval_ms().is_infinite() {
            tracing::warn!(spawn_rate = engine.config.spawn_rate, "spawn rate is not positive; engine will never spawn");
        }
        tracing::debug!(
            width = engine.canvas_size[0],
            height = engine.canvas_size[1],
            max_particles = engine.config.max_particles,
            initial = engine.particles.len(),
            reduced_motion = engine.environment.prefers_reduced_motion,
            "particle engine created"
        );

        Ok(engine)
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Starts the loop. No-op while already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        // The first frame after (re)starting applies no time
        self.last_frame_ms = None;
        self.fps.reset();
        tracing::debug!(particles = self.particles.len(), "particle engine started");
    }

    /// Stops the loop. Particles are kept so [`start`](Self::start) resumes.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        tracing::debug!(particles = self.particles.len(), "particle engine stopped");
    }

    /// Whether the loop is running.
    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Stops and drops every particle, leaving the engine empty.
    ///
    /// Used when the engine is shared and cannot be consumed; prefer
    /// [`destroy`](Self::destroy).
    pub fn shutdown(&mut self) {
        self.stop();
        self.retired_total += self.particles.len() as u64;
        self.particles.clear();
        self.spawn_accumulator = 0.0;
        self.context.clear(self.canvas_size[0], self.canvas_size[1]);
        tracing::debug!("particle engine shut down");
    }

    /// Stops, clears and hands the surface back to the host.
    ///
    /// The engine is consumed; animating again needs a new engine.
    pub fn destroy(mut self) -> S {
        self.shutdown();
        self.surface
    }

    // ========================================================================
    // FRAME
    // ========================================================================

    /// Runs one full frame at host timestamp `now_ms`.
    ///
    /// Returns `None` without touching any state when the engine is stopped.
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameReport> {
        if !self.running {
            return None;
        }

        let elapsed = match self.last_frame_ms {
            Some(previous) if now_ms.is_finite() => (now_ms - previous).max(0.0) as f32,
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_frame_ms = Some(now_ms);
            self.fps.record_frame(now_ms);
        }
        let delta_ms = elapsed.min(MAX_FRAME_DELTA_MS) * self.environment.motion_scale();

        let spawned_before = self.spawned_total;
        let retired_before = self.retired_total;
        self.update(delta_ms);
        let drawn = self.render();
        self.frames_rendered += 1;

        Some(FrameReport {
            delta_ms,
            spawned: self.spawned_total - spawned_before,
            retired: self.retired_total - retired_before,
            drawn,
        })
    }

    /// Advances the simulation by `delta_ms`: update, prune, spawn.
    ///
    /// No capping or motion scaling happens here; [`frame`](Self::frame)
    /// does that before calling in.
    pub fn update(&mut self, delta_ms: f32) {
        let delta = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };

        for particle in &mut self.particles {
            particle.update(delta);
        }

        let before = self.particles.len();
        self.particles.retain(|p| !p.should_remove());
        let retired = before - self.particles.len();
        if retired > 0 {
            self.retired_total += retired as u64;
            tracing::trace!(retired, live = self.particles.len(), "retired particles");
        }

        self.advance_spawner(delta);
    }

    fn advance_spawner(&mut self, delta: f32) {
        if self.spawn_interval.is_infinite() {
            self.spawn_accumulator = 0.0;
            return;
        }

        self.spawn_accumulator += delta;
        while self.spawn_accumulator >= self.spawn_interval && self.particles.len() < self.config.max_particles {
            self.spawn_particle();
            self.spawn_accumulator -= self.spawn_interval;
            self.spawn_interval = jittered(self.config.spawn_interval_ms(), &mut self.rng);
        }

        // At the cap: hold at most one pending spawn instead of bursting later
        if self.particles.len() >= self.config.max_particles {
            self.spawn_accumulator = self.spawn_accumulator.min(self.spawn_interval);
        }
    }

    /// Clears the surface and draws every visible particle.
    ///
    /// Returns the number of glyphs drawn.
    pub fn render(&mut self) -> usize {
        let [width, height] = self.canvas_size;
        self.context.clear(width, height);

        if width <= 0.0 || height <= 0.0 {
            self.last_frame_drawn = 0;
            return 0;
        }

        if self.config.sort_by_depth {
            self.particles.sort_by(|a, b| a.depth().total_cmp(&b.depth()));
        }

        let mut drawn = 0;
        for particle in &self.particles {
            if let Some(instance) = particle.instance(&self.config.palette, self.config.font_size) {
                self.context.draw_glyph(&instance);
                drawn += 1;
            }
        }

        self.last_frame_drawn = drawn;
        drawn
    }

    // ========================================================================
    // SPAWNING
    // ========================================================================

    /// Spawns one random particle. Returns `false` at the cap.
    pub fn spawn_particle(&mut self) -> bool {
        if self.particles.len() >= self.config.max_particles {
            return false;
        }
        let params = SpawnParams::random(&mut self.rng, &self.config);
        self.push(params);
        true
    }

    /// Spawns a particle with explicit parameters. Returns `false` at the cap.
    pub fn spawn_with(&mut self, params: SpawnParams) -> bool {
        if self.particles.len() >= self.config.max_particles {
            return false;
        }
        self.push(params);
        true
    }

    fn push(&mut self, params: SpawnParams) {
        self.particles.push(Particle::new(params, self.canvas_size));
        self.spawned_total += 1;
        tracing::trace!(glyph = %params.glyph, depth = params.depth, live = self.particles.len(), "spawned particle");
    }

    // ========================================================================
    // HOST CONTROLS
    // ========================================================================

    /// Resizes to `width` × `height` CSS pixels.
    ///
    /// The backing store becomes `size × device pixel ratio` and every live
    /// particle keeps its relative placement. Zero-area sizes are accepted;
    /// nothing renders until the next non-zero resize.
    pub fn resize(&mut self, width: f32, height: f32) {
        let width = clean_dimension(width);
        let height = clean_dimension(height);
        if width <= 0.0 || height <= 0.0 {
            tracing::warn!(width, height, "resized to a zero-area surface");
        }

        self.canvas_size = [width, height];
        self.apply_backing_size();
        for particle in &mut self.particles {
            particle.resize(width, height);
        }
        tracing::debug!(width, height, particles = self.particles.len(), "particle engine resized");
    }

    fn apply_backing_size(&mut self) {
        let ratio = self.environment.pixel_ratio();
        let [width, height] = self.canvas_size;
        self.surface
            .set_backing_size(device_pixels(width * ratio), device_pixels(height * ratio));
        self.context.set_pixel_ratio(ratio);
    }

    /// Merges `patch` into the running config.
    ///
    /// The new spawn interval applies from the next spawn decision. Live
    /// particles keep the drift and depth speed they spawned with. Lowering
    /// `max_particles` below the live count retires the last particles in
    /// paint order so the cap holds immediately.
    pub fn update_config(&mut self, patch: &ConfigPatch) {
        self.config.apply(patch);
        self.spawn_interval = self.config.spawn_interval_ms();

        if self.particles.len() > self.config.max_particles {
            let excess = self.particles.len() - self.config.max_particles;
            self.particles.truncate(self.config.max_particles);
            self.retired_total += excess as u64;
        }

        tracing::debug!(
            spawn_rate = self.config.spawn_rate,
            max_particles = self.config.max_particles,
            drift_intensity = self.config.drift_intensity,
            depth_speed = self.config.depth_speed,
            "particle engine config updated"
        );
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    /// Debug snapshot.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            fps: self.fps.fps(),
            particle_count: self.particles.len(),
            is_running: self.running,
            frames_rendered: self.frames_rendered,
            spawned_total: self.spawned_total,
            retired_total: self.retired_total,
            last_frame_drawn: self.last_frame_drawn,
        }
    }

    /// Live particles in paint order.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Current config.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Logical size in CSS pixels.
    #[must_use]
    pub const fn canvas_size(&self) -> [f32; 2] {
        self.canvas_size
    }

    /// The host environment the engine was created with.
    #[must_use]
    pub const fn environment(&self) -> &HostEnvironment {
        &self.environment
    }

    /// Milliseconds until the next spawn is due, before the accumulator.
    #[must_use]
    pub const fn spawn_interval_ms(&self) -> f32 {
        self.spawn_interval
    }

    /// The drawing surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The drawing context.
    #[must_use]
    pub const fn context(&self) -> &S::Context {
        &self.context
    }
}

impl<S: DrawSurface> std::fmt::Debug for ParticleEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleEngine")
            .field("config", &self.config)
            .field("canvas_size", &self.canvas_size)
            .field("particles", &self.particles.len())
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

/// Base interval scaled by a random factor in `[1 - JITTER, 1 + JITTER]`.
fn jittered<R: Rng + ?Sized>(base: f32, rng: &mut R) -> f32 {
    if base.is_finite() {
        base * (1.0 + rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER))
    } else {
        base
    }
}

fn clean_dimension(v: f32) -> f32 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

fn device_pixels(v: f32) -> u32 {
    // Non-negative and finite by construction; saturates on absurd sizes
    v.round() as u32
}
