//! Drawing surface contract.
//!
//! The engine never touches a concrete canvas. The host hands it something
//! implementing [`DrawSurface`]; the engine asks it once for a 2D context and
//! from then on only issues three calls per frame: set the pixel ratio (on
//! resize), clear, draw glyph instances.
//!
//! [`RecordingSurface`] keeps the last frame in memory. Tests inspect it, and
//! GPU hosts upload [`RecordingContext::frame_bytes`] as an instance buffer.

use bytemuck::{Pod, Zeroable};

/// One glyph, fully resolved for drawing.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GlyphInstance {
    /// Center of the glyph in CSS pixels.
    pub position: [f32; 2],
    /// Rotation in radians.
    pub rotation: f32,
    /// Font size in CSS pixels (base size × perspective scale).
    pub font_size: f32,
    /// sRGB color + opacity.
    pub color: [f32; 4],
    /// Gaussian blur radius in CSS pixels.
    pub blur: f32,
    /// Depth (0 = far, 1 = at viewer), for hosts that sort on the GPU.
    pub depth: f32,
    /// Unicode scalar value of the glyph.
    pub glyph: u32,
    /// Always zero. Keeps the struct a multiple of 16 bytes.
    pub reserved: u32,
}

impl GlyphInstance {
    /// Size of an instance in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Returns the glyph as a `char`.
    #[inline]
    #[must_use]
    pub fn glyph_char(&self) -> Option<char> {
        char::from_u32(self.glyph)
    }

    /// Returns the opacity.
    #[inline]
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.color[3]
    }
}

/// A 2D drawing context obtained from a [`DrawSurface`].
pub trait DrawContext {
    /// Sets device pixels per CSS pixel for subsequent drawing.
    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Clears a `width` × `height` CSS-pixel area.
    fn clear(&mut self, width: f32, height: f32);

    /// Draws one glyph.
    fn draw_glyph(&mut self, glyph: &GlyphInstance);
}

/// A host-owned drawing surface.
///
/// The engine never disposes the surface; `destroy` hands it back.
pub trait DrawSurface {
    /// Context type handed out by this surface.
    type Context: DrawContext;

    /// Acquires a 2D context, or `None` if the surface cannot provide one.
    fn context_2d(&mut self) -> Option<Self::Context>;

    /// Current logical (CSS-pixel) size.
    fn logical_size(&self) -> (f32, f32);

    /// Resizes the device-pixel backing store.
    fn set_backing_size(&mut self, width: u32, height: u32);
}

// ============================================================================
// IN-MEMORY RECORDING
// ============================================================================

/// A surface that records instead of drawing.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    logical: (f32, f32),
    backing: (u32, u32),
    context_available: bool,
}

impl RecordingSurface {
    /// Creates a surface of the given logical size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            logical: (width, height),
            backing: (0, 0),
            context_available: true,
        }
    }

    /// Creates a surface whose context acquisition always fails.
    #[must_use]
    pub const fn without_context(width: f32, height: f32) -> Self {
        Self {
            context_available: false,
            ..Self::new(width, height)
        }
    }

    /// Returns the backing-store size last set by the engine.
    #[must_use]
    pub const fn backing_size(&self) -> (u32, u32) {
        self.backing
    }
}

impl DrawSurface for RecordingSurface {
    type Context = RecordingContext;

    fn context_2d(&mut self) -> Option<RecordingContext> {
        self.context_available.then(RecordingContext::new)
    }

    fn logical_size(&self) -> (f32, f32) {
        self.logical
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.backing = (width, height);
    }
}

/// Context of a [`RecordingSurface`]. Holds the most recent frame.
#[derive(Debug, Clone)]
pub struct RecordingContext {
    pixel_ratio: f32,
    last_clear: Option<(f32, f32)>,
    clear_count: u64,
    frame: Vec<GlyphInstance>,
}

impl RecordingContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            last_clear: None,
            clear_count: 0,
            frame: Vec::with_capacity(64),
        }
    }

    /// Glyphs drawn since the last clear, in paint order.
    #[must_use]
    pub fn frame(&self) -> &[GlyphInstance] {
        &self.frame
    }

    /// The current frame as raw bytes for GPU upload.
    #[must_use]
    pub fn frame_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.frame)
    }

    /// Number of clears (one per rendered frame).
    #[must_use]
    pub const fn clear_count(&self) -> u64 {
        self.clear_count
    }

    /// Size passed to the most recent clear.
    #[must_use]
    pub const fn last_clear(&self) -> Option<(f32, f32)> {
        self.last_clear
    }

    /// Pixel ratio last set by the engine.
    #[must_use]
    pub const fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawContext for RecordingContext {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn clear(&mut self, width: f32, height: f32) {
        self.frame.clear();
        self.last_clear = Some((width, height));
        self.clear_count += 1;
    }

    fn draw_glyph(&mut self, glyph: &GlyphInstance) {
        self.frame.push(*glyph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layout() {
        // 12 x 4-byte fields, 16-byte multiple for instance buffers
        assert_eq!(GlyphInstance::SIZE, 48);
        assert_eq!(GlyphInstance::SIZE % 16, 0);
    }

    #[test]
    fn test_recording_frame_bytes() {
        let mut surface = RecordingSurface::new(100.0, 50.0);
        let mut ctx = surface.context_2d().unwrap();

        ctx.clear(100.0, 50.0);
        ctx.draw_glyph(&GlyphInstance {
            glyph: u32::from('$'),
            ..GlyphInstance::default()
        });

        assert_eq!(ctx.frame().len(), 1);
        assert_eq!(ctx.frame_bytes().len(), GlyphInstance::SIZE);
        assert_eq!(ctx.frame()[0].glyph_char(), Some('$'));

        ctx.clear(100.0, 50.0);
        assert!(ctx.frame().is_empty());
        assert_eq!(ctx.clear_count(), 2);
    }

    #[test]
    fn test_missing_context() {
        let mut surface = RecordingSurface::without_context(10.0, 10.0);
        assert!(surface.context_2d().is_none());
    }
}
