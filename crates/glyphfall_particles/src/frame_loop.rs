//! Frame Loop - binds an engine to a display-refresh scheduler
//!
//! ```text
//!   start() ──▶ request_frame ──▶ [host waits for vsync] ──▶ callback(ts)
//!                    ▲                                          │
//!                    │                         lock engine, running?
//!                    │                              │ yes         │ no
//!                    └──────── request_frame ◀── frame(ts)     return
//! ```
//!
//! The engine lives behind a `parking_lot::Mutex` so a host resize arriving
//! on another event-loop turn is serialized with frame bodies: a resize
//! always completes before the next render sees the new size.
//!
//! Cancellation is belt and braces. `stop()` cancels the pending handle, and
//! every callback re-checks the running flag under the lock, so a callback
//! that slipped past cancellation never mutates a stopped engine.

use std::sync::Arc;

use glyphfall_core::{FrameHandle, FrameScheduler};
use parking_lot::{Mutex, MutexGuard};

use crate::config::ConfigPatch;
use crate::engine::{EngineStats, ParticleEngine};
use crate::surface::DrawSurface;

/// Drives a [`ParticleEngine`] once per display refresh.
pub struct FrameLoop<S, F>
where
    S: DrawSurface + 'static,
    S::Context: 'static,
    F: FrameScheduler + Clone + 'static,
{
    engine: Arc<Mutex<ParticleEngine<S>>>,
    scheduler: F,
    pending: Arc<Mutex<Option<FrameHandle>>>,
}

impl<S, F> FrameLoop<S, F>
where
    S: DrawSurface + 'static,
    S::Context: 'static,
    F: FrameScheduler + Clone + 'static,
{
    /// Wraps an engine. Nothing is scheduled until [`start`](Self::start).
    #[must_use]
    pub fn new(engine: ParticleEngine<S>, scheduler: F) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            scheduler,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts the engine and schedules the first frame. No-op while running.
    pub fn start(&self) {
        {
            let mut engine = self.engine.lock();
            if engine.is_running() {
                return;
            }
            engine.start();
        }
        // A pause through the shared handle leaves its callback queued
        if let Some(stale) = self.pending.lock().take() {
            self.scheduler.cancel_frame(stale);
        }
        schedule_next(
            Arc::clone(&self.engine),
            self.scheduler.clone(),
            Arc::clone(&self.pending),
        );
    }

    /// Stops the engine and cancels the pending frame. Particles are kept.
    pub fn stop(&self) {
        self.engine.lock().stop();
        if let Some(handle) = self.pending.lock().take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    /// Whether the engine is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.engine.lock().is_running()
    }

    /// Forwards a host resize (CSS pixels).
    pub fn resize(&self, width: f32, height: f32) {
        self.engine.lock().resize(width, height);
    }

    /// Forwards a config change.
    pub fn update_config(&self, patch: &ConfigPatch) {
        self.engine.lock().update_config(patch);
    }

    /// Debug snapshot.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.engine.lock().stats()
    }

    /// Locks the engine for direct access.
    ///
    /// Do not hold the guard across a scheduler tick: frame callbacks take
    /// the same lock.
    pub fn engine(&self) -> MutexGuard<'_, ParticleEngine<S>> {
        self.engine.lock()
    }

    /// Shared handle for host callbacks (resize observers and the like).
    #[must_use]
    pub fn shared_engine(&self) -> Arc<Mutex<ParticleEngine<S>>> {
        Arc::clone(&self.engine)
    }

    /// Stops for good and hands the surface back.
    ///
    /// Returns `None` when a host callback still holds a shared handle; the
    /// engine is then shut down in place (stopped and emptied) instead.
    pub fn destroy(self) -> Option<S> {
        self.stop();
        match Arc::try_unwrap(self.engine) {
            Ok(engine) => Some(engine.into_inner().destroy()),
            Err(shared) => {
                tracing::debug!("engine still shared at destroy; shutting down in place");
                shared.lock().shutdown();
                None
            }
        }
    }
}

impl<S, F> std::fmt::Debug for FrameLoop<S, F>
where
    S: DrawSurface + 'static,
    S::Context: 'static,
    F: FrameScheduler + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("pending", &*self.pending.lock())
            .finish_non_exhaustive()
    }
}

fn schedule_next<S, F>(
    engine: Arc<Mutex<ParticleEngine<S>>>,
    scheduler: F,
    pending: Arc<Mutex<Option<FrameHandle>>>,
) where
    S: DrawSurface + 'static,
    S::Context: 'static,
    F: FrameScheduler + Clone + 'static,
{
    let next_scheduler = scheduler.clone();
    let next_pending = Arc::clone(&pending);

    let handle = scheduler.request_frame(Box::new(move |timestamp| {
        next_pending.lock().take();

        let keep_going = {
            let mut engine = engine.lock();
            match engine.frame(timestamp) {
                Some(report) => {
                    tracing::trace!(
                        delta_ms = report.delta_ms,
                        spawned = report.spawned,
                        retired = report.retired,
                        drawn = report.drawn,
                        "frame"
                    );
                    engine.is_running()
                }
                // Stopped between scheduling and firing
                None => false,
            }
        };

        if keep_going {
            schedule_next(engine, next_scheduler, next_pending);
        }
    }));

    *pending.lock() = Some(handle);
}
