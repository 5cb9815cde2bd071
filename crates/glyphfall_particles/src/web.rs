//! Browser adapter: HTML canvas surface and `requestAnimationFrame` scheduler.
//!
//! ```ignore
//! let window = web_sys::window().ok_or(EngineError::ContextUnavailable)?;
//! let surface = CanvasSurface::new(canvas);
//! let engine = ParticleEngine::new(surface, &ConfigPatch::new(), HostEnvironment::from_window(&window))?;
//! let frame_loop = FrameLoop::new(engine, AnimationFrameScheduler::new(window));
//! frame_loop.start();
//! ```
//!
//! Drawing failures inside a frame are logged and skipped; a single bad
//! glyph never tears down the loop.

use glyphfall_core::{FrameCallback, FrameHandle, FrameScheduler, Rgb};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

use crate::environment::HostEnvironment;
use crate::surface::{DrawContext, DrawSurface, GlyphInstance};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";
const FONT_FAMILY: &str = "system-ui, sans-serif";

// ============================================================================
// ENVIRONMENT
// ============================================================================

impl HostEnvironment {
    /// Reads device pixel ratio and the reduced-motion preference.
    ///
    /// A failing media query counts as "no preference".
    #[must_use]
    pub fn from_window(window: &Window) -> Self {
        let prefers_reduced_motion = match window.match_media(REDUCED_MOTION_QUERY) {
            Ok(Some(list)) => list.matches(),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(?err, "reduced-motion media query failed");
                false
            }
        };
        #[allow(clippy::cast_possible_truncation)]
        let device_pixel_ratio = window.device_pixel_ratio() as f32;
        Self::new(device_pixel_ratio, prefers_reduced_motion)
    }
}

// ============================================================================
// SURFACE
// ============================================================================

/// An HTML `<canvas>` element.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    /// Wraps a canvas. The host keeps ownership; `destroy` hands it back.
    #[must_use]
    pub const fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    /// The wrapped element.
    #[must_use]
    pub const fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Unwraps the element.
    #[must_use]
    pub fn into_inner(self) -> HtmlCanvasElement {
        self.canvas
    }
}

impl DrawSurface for CanvasSurface {
    type Context = CanvasContext;

    fn context_2d(&mut self) -> Option<CanvasContext> {
        let object = match self.canvas.get_context("2d") {
            Ok(Some(object)) => object,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(?err, "getContext(\"2d\") threw");
                return None;
            }
        };
        let ctx = object.dyn_into::<CanvasRenderingContext2d>().ok()?;
        Some(CanvasContext { ctx, pixel_ratio: 1.0 })
    }

    #[allow(clippy::cast_precision_loss)]
    fn logical_size(&self) -> (f32, f32) {
        (self.canvas.client_width() as f32, self.canvas.client_height() as f32)
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }
}

/// `CanvasRenderingContext2d` wrapper.
#[derive(Debug, Clone)]
pub struct CanvasContext {
    ctx: CanvasRenderingContext2d,
    pixel_ratio: f32,
}

impl DrawContext for CanvasContext {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn clear(&mut self, width: f32, height: f32) {
        let ratio = f64::from(self.pixel_ratio);
        // Resizing the backing store resets the transform; reapply every frame
        if let Err(err) = self.ctx.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0) {
            tracing::warn!(?err, "setTransform failed");
        }
        self.ctx.clear_rect(0.0, 0.0, f64::from(width), f64::from(height));
    }

    fn draw_glyph(&mut self, glyph: &GlyphInstance) {
        let Some(ch) = glyph.glyph_char() else {
            return;
        };
        let mut buf = [0u8; 4];
        let text = ch.encode_utf8(&mut buf);
        let [r, g, b, alpha] = glyph.color;

        self.ctx.save();
        let drawn = self
            .ctx
            .translate(f64::from(glyph.position[0]), f64::from(glyph.position[1]))
            .and_then(|()| self.ctx.rotate(f64::from(glyph.rotation)))
            .and_then(|()| {
                self.ctx.set_global_alpha(f64::from(alpha));
                if glyph.blur > 0.0 {
                    self.ctx.set_filter(&format!("blur({:.2}px)", glyph.blur));
                } else {
                    self.ctx.set_filter("none");
                }
                self.ctx.set_font(&format!("{:.1}px {FONT_FAMILY}", glyph.font_size));
                self.ctx.set_text_align("center");
                self.ctx.set_text_baseline("middle");
                self.ctx.set_fill_style_str(&Rgb::new(r, g, b).to_css(1.0));
                self.ctx.fill_text(text, 0.0, 0.0)
            });
        self.ctx.restore();

        if let Err(err) = drawn {
            tracing::warn!(?err, glyph = %ch, "failed to draw glyph");
        }
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Schedules frames with `window.requestAnimationFrame`.
#[derive(Debug, Clone)]
pub struct AnimationFrameScheduler {
    window: Window,
}

impl AnimationFrameScheduler {
    /// Creates a scheduler bound to `window`.
    #[must_use]
    pub const fn new(window: Window) -> Self {
        Self { window }
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let closure = Closure::once_into_js(move |timestamp: f64| callback(timestamp));
        match self.window.request_animation_frame(closure.unchecked_ref()) {
            Ok(id) => FrameHandle::from_raw(u64::from(id.unsigned_abs())),
            Err(err) => {
                tracing::warn!(?err, "requestAnimationFrame failed; loop halts");
                FrameHandle::from_raw(0)
            }
        }
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let Ok(id) = i32::try_from(handle.raw()) else {
            return;
        };
        if let Err(err) = self.window.cancel_animation_frame(id) {
            tracing::warn!(?err, "cancelAnimationFrame failed");
        }
    }
}
