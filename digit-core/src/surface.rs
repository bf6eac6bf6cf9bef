//! The RGBA pixel grid strokes are rasterized onto.

use tiny_skia::{
    ColorU8, LineCap, LineJoin, Paint, PathBuilder, PixmapMut, PremultipliedColorU8, Stroke,
    Transform,
};

use crate::error::{CanvasError, CanvasResult};
use crate::mapper::PointerSample;
use crate::stroke::StrokeStyle;

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Value every channel holds on a blank surface (opaque white).
pub const BLANK_CHANNEL: u8 = 255;

/// Side length of the default square surface.
pub const DEFAULT_SURFACE_SIZE: u32 = 28;

/// Fixed-size RGBA surface, row-major, non-premultiplied.
///
/// The buffer always holds exactly `width * height * 4` bytes and is never
/// resized after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SurfaceBuffer {
    /// Allocate a blank surface.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] if either side is zero.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![BLANK_CHANNEL; byte_len(width, height)],
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at `(x, y)`, or `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let offset = self.offset(x, y)?;
        let mut rgba = [0; CHANNELS];
        rgba.copy_from_slice(&self.pixels[offset..offset + CHANNELS]);
        Some(rgba)
    }

    /// Whether every channel of every pixel is [`BLANK_CHANNEL`].
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&c| c == BLANK_CHANNEL)
    }

    /// Coordinates of every pixel that differs from opaque white, row-major.
    #[must_use]
    pub fn inked_pixels(&self) -> Vec<(u32, u32)> {
        let width = self.width as usize;
        self.pixels
            .chunks_exact(CHANNELS)
            .enumerate()
            .filter(|(_, px)| px.iter().any(|&c| c != BLANK_CHANNEL))
            .map(|(i, _)| {
                #[allow(clippy::cast_possible_truncation)]
                let (x, y) = ((i % width) as u32, (i / width) as u32);
                (x, y)
            })
            .collect()
    }

    /// Reset every channel byte to 255, producing opaque white.
    ///
    /// Idempotent; valid on a surface that was never drawn on.
    pub fn reset(&mut self) {
        let mut blank = std::mem::take(&mut self.pixels);
        blank.fill(BLANK_CHANNEL);
        self.pixels = blank;
    }

    /// Replace the whole buffer in one write.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::BufferLength`] if `data` is not exactly
    /// `width * height * 4` bytes; the surface is left untouched.
    pub fn replace_pixels(&mut self, data: Vec<u8>) -> CanvasResult<()> {
        if data.len() != self.pixels.len() {
            return Err(CanvasError::BufferLength {
                expected: self.pixels.len(),
                actual: data.len(),
            });
        }
        self.pixels = data;
        Ok(())
    }

    /// Stroke a straight segment with round caps and joins.
    ///
    /// The segment is rasterized anti-aliased by tiny-skia and composited
    /// source-over. Zero-length and non-finite segments draw nothing.
    #[allow(clippy::cast_possible_truncation)]
    pub fn stroke_segment(&mut self, from: PointerSample, to: PointerSample, style: &StrokeStyle) {
        let finite = [from.x, from.y, to.x, to.y].iter().all(|v| v.is_finite());
        if !finite || from == to {
            return;
        }

        let mut builder = PathBuilder::new();
        builder.move_to(from.x as f32, from.y as f32);
        builder.line_to(to.x as f32, to.y as f32);
        let Some(path) = builder.finish() else {
            return;
        };

        let [r, g, b, a] = style.color;
        let mut paint = Paint {
            anti_alias: true,
            ..Paint::default()
        };
        paint.set_color_rgba8(r, g, b, a);
        let stroke = Stroke {
            width: style.width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        // tiny-skia draws into premultiplied RGBA; the surface stores it straight.
        premultiply(&mut self.pixels);
        match PixmapMut::from_bytes(&mut self.pixels, self.width, self.height) {
            Some(mut pixmap) => {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            None => tracing::warn!(
                width = self.width,
                height = self.height,
                "Surface cannot be viewed as a pixmap"
            ),
        }
        demultiply(&mut self.pixels);
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * CHANNELS)
    }
}

impl Default for SurfaceBuffer {
    fn default() -> Self {
        Self {
            width: DEFAULT_SURFACE_SIZE,
            height: DEFAULT_SURFACE_SIZE,
            pixels: vec![BLANK_CHANNEL; byte_len(DEFAULT_SURFACE_SIZE, DEFAULT_SURFACE_SIZE)],
        }
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

fn premultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(CHANNELS) {
        if px[3] == u8::MAX {
            continue;
        }
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        px.copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
}

fn demultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(CHANNELS) {
        if px[3] == u8::MAX {
            continue;
        }
        if let Some(c) = PremultipliedColorU8::from_rgba(px[0], px[1], px[2], px[3]) {
            let c = c.demultiply();
            px.copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black() -> StrokeStyle {
        StrokeStyle::default()
    }

    #[test]
    fn new_surface_is_blank_white() {
        let surface = SurfaceBuffer::new(28, 28).expect("surface");
        assert_eq!(surface.pixels().len(), 28 * 28 * 4);
        assert!(surface.is_blank());
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            SurfaceBuffer::new(0, 28),
            Err(CanvasError::InvalidDimensions { width: 0, height: 28 })
        ));
        assert!(SurfaceBuffer::new(28, 0).is_err());
    }

    #[test]
    fn default_is_28_square() {
        let surface = SurfaceBuffer::default();
        assert_eq!((surface.width(), surface.height()), (28, 28));
        assert!(surface.is_blank());
    }

    #[test]
    fn pixel_outside_is_none() {
        let surface = SurfaceBuffer::new(4, 3).expect("surface");
        assert!(surface.pixel(4, 0).is_none());
        assert!(surface.pixel(0, 3).is_none());
        assert!(surface.pixel(3, 2).is_some());
    }

    fn is_dark(px: Option<[u8; 4]>) -> bool {
        px.is_some_and(|[r, g, b, a]| r < 64 && g < 64 && b < 64 && a == 255)
    }

    #[test]
    fn horizontal_segment_inks_its_row() {
        let mut surface = SurfaceBuffer::new(10, 10).expect("surface");
        surface.stroke_segment(
            PointerSample::new(2.0, 4.5),
            PointerSample::new(7.0, 4.5),
            &black(),
        );
        for x in 3..7 {
            assert!(is_dark(surface.pixel(x, 4)), "x={x}");
        }
        assert_eq!(surface.pixel(5, 6), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(5, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn zero_length_segment_is_pruned() {
        let mut surface = SurfaceBuffer::new(10, 10).expect("surface");
        let p = PointerSample::new(3.0, 3.0);
        surface.stroke_segment(p, p, &black());
        assert!(surface.is_blank());
    }

    #[test]
    fn non_finite_segment_is_ignored() {
        let mut surface = SurfaceBuffer::new(10, 10).expect("surface");
        surface.stroke_segment(
            PointerSample::new(f64::NAN, 1.0),
            PointerSample::new(5.0, 5.0),
            &black(),
        );
        assert!(surface.is_blank());
    }

    #[test]
    fn segment_outside_surface_draws_nothing() {
        let mut surface = SurfaceBuffer::new(10, 10).expect("surface");
        surface.stroke_segment(
            PointerSample::new(-20.0, -20.0),
            PointerSample::new(-10.0, -15.0),
            &black(),
        );
        assert!(surface.is_blank());
    }

    #[test]
    fn segment_is_clipped_to_surface() {
        let mut surface = SurfaceBuffer::new(10, 10).expect("surface");
        surface.stroke_segment(
            PointerSample::new(-5.0, 5.5),
            PointerSample::new(50.0, 5.5),
            &black(),
        );
        for x in 0..10 {
            assert!(is_dark(surface.pixel(x, 5)), "x={x}");
        }
        assert_eq!(surface.pixel(5, 8), Some([255, 255, 255, 255]));
    }

    #[test]
    fn partial_coverage_is_grey_and_opaque() {
        let mut surface = SurfaceBuffer::new(10, 10).expect("surface");
        // Runs along the boundary between rows 4 and 5.
        surface.stroke_segment(
            PointerSample::new(2.0, 5.0),
            PointerSample::new(8.0, 5.0),
            &black(),
        );
        for y in [4, 5] {
            let [r, g, b, a] = surface.pixel(5, y).expect("pixel");
            assert!(r > 0 && r < 255, "expected grey at y={y}, got {r}");
            assert_eq!((r, g), (g, b));
            assert_eq!(a, 255);
        }
    }

    #[test]
    fn wide_segment_has_round_caps() {
        let mut surface = SurfaceBuffer::new(10, 10).expect("surface");
        let style = StrokeStyle {
            width: 4.0,
            ..black()
        };
        surface.stroke_segment(
            PointerSample::new(3.0, 5.0),
            PointerSample::new(6.0, 5.0),
            &style,
        );
        // Inside the cap disc, ahead of the start point.
        assert!(surface.pixel(1, 5).expect("pixel")[0] < 128);
        // Corner a square cap would fill.
        assert!(surface.pixel(1, 3).expect("pixel")[0] > 128);
        assert!(is_dark(surface.pixel(4, 4)));
    }

    #[test]
    fn reset_restores_blank_and_is_idempotent() {
        let mut surface = SurfaceBuffer::new(10, 10).expect("surface");
        surface.stroke_segment(
            PointerSample::new(1.0, 1.0),
            PointerSample::new(8.0, 8.0),
            &black(),
        );
        assert!(!surface.is_blank());
        surface.reset();
        let once = surface.clone();
        surface.reset();
        assert!(surface.is_blank());
        assert_eq!(surface, once);
    }

    #[test]
    fn replace_pixels_checks_length() {
        let mut surface = SurfaceBuffer::new(2, 2).expect("surface");
        let err = surface.replace_pixels(vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            CanvasError::BufferLength {
                expected: 16,
                actual: 15
            }
        ));
        assert!(surface.is_blank());

        surface.replace_pixels(vec![0; 16]).expect("replace");
        assert_eq!(surface.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn inked_pixels_lists_changed_pixels() {
        let mut surface = SurfaceBuffer::new(3, 2).expect("surface");
        let mut data = vec![BLANK_CHANNEL; 24];
        data[4 * 4] = 0; // (1, 1) red channel
        surface.replace_pixels(data).expect("replace");
        assert_eq!(surface.inked_pixels(), vec![(1, 1)]);
    }
}
