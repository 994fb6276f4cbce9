//! Drawing context bound to a resized surface.
//!
//! A [`Canvas`] holds the only mutable borrow of the surface for the length
//! of one render, so a surface can never be drawn on from two places at once.
//! Clip masks are owned by the canvas and dropped with it.

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};

use crate::clip::{ClipPath, OUTSIDE};
use crate::error::DrawError;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub struct Canvas<'a> {
    surface: &'a mut RgbaImage,
    clip: Option<GrayImage>,
}

impl<'a> Canvas<'a> {
    pub fn new(surface: &'a mut RgbaImage) -> Self {
        Self {
            surface,
            clip: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn surface(&self) -> &RgbaImage {
        &*self.surface
    }

    pub fn snapshot(&self) -> RgbaImage {
        self.surface.clone()
    }

    /// Overwrite every pixel with `snapshot`, ignoring the clip. A snapshot
    /// of a different size is ignored.
    pub fn restore(&mut self, snapshot: &RgbaImage) {
        if snapshot.dimensions() == self.surface.dimensions() {
            self.surface.copy_from_slice(snapshot.as_raw());
        }
    }

    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    pub fn set_clip(&mut self, path: &ClipPath) -> Result<(), DrawError> {
        let mask = path.rasterize(self.width(), self.height())?;
        self.clip = Some(mask);
        Ok(())
    }

    pub fn set_clip_mask(&mut self, mask: GrayImage) -> Result<(), DrawError> {
        if mask.dimensions() != self.surface.dimensions() {
            return Err(DrawError::ClipSizeMismatch {
                mask_width: mask.width(),
                mask_height: mask.height(),
                width: self.width(),
                height: self.height(),
            });
        }
        self.clip = Some(mask);
        Ok(())
    }

    pub fn reset_clip(&mut self) {
        self.clip = None;
    }

    fn clipped(&self, x: u32, y: u32) -> bool {
        self.clip
            .as_ref()
            .is_some_and(|mask| *mask.get_pixel(x, y) == OUTSIDE)
    }

    /// Fill the clip region (or the whole surface) with `color`.
    pub fn clear(&mut self, color: Rgba<u8>) {
        match self.clip.take() {
            None => {
                for pixel in self.surface.pixels_mut() {
                    *pixel = color;
                }
            }
            Some(mask) => {
                for (pixel, coverage) in self.surface.pixels_mut().zip(mask.pixels()) {
                    if *coverage != OUTSIDE {
                        *pixel = color;
                    }
                }
                self.clip = Some(mask);
            }
        }
    }

    /// Composite `image` over the surface at `(x, y)` scaled to
    /// `width × height`, honouring the clip. Parts falling outside the
    /// surface are skipped.
    pub fn draw_image(
        &mut self,
        image: &RgbaImage,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> Result<(), DrawError> {
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            return Err(DrawError::EmptySurface);
        }

        let scaled;
        let source = if image.dimensions() == (width, height) {
            image
        } else {
            scaled = imageops::resize(image, width, height, FilterType::Triangle);
            &scaled
        };

        for (sx, sy, src) in source.enumerate_pixels() {
            let dx = x + i64::from(sx);
            let dy = y + i64::from(sy);
            if dx < 0 || dy < 0 || dx >= i64::from(self.width()) || dy >= i64::from(self.height()) {
                continue;
            }
            let (dx, dy) = (dx as u32, dy as u32);
            if self.clipped(dx, dy) {
                continue;
            }
            composite(self.surface.get_pixel_mut(dx, dy), src);
        }
        Ok(())
    }
}

/// Source-over with straight alpha. Fully opaque sources and fully
/// transparent destinations are copied exactly, and an opaque destination
/// stays opaque.
fn composite(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    match (dst[3], src[3]) {
        (_, 0) => {}
        (0, _) | (_, 255) => *dst = *src,
        (255, sa) => {
            let a = f32::from(sa) / 255.0;
            for c in 0..3 {
                dst[c] = mix(f32::from(src[c]) * a, f32::from(dst[c]) * (1.0 - a), 1.0);
            }
        }
        (da, sa) => {
            let sa = f32::from(sa) / 255.0;
            let da = f32::from(da) / 255.0 * (1.0 - sa);
            let out = sa + da;
            for c in 0..3 {
                dst[c] = mix(f32::from(src[c]) * sa, f32::from(dst[c]) * da, out);
            }
            dst[3] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn mix(src: f32, dst: f32, alpha: f32) -> u8 {
    ((src + dst) / alpha).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn clear_without_clip_fills_everything() {
        let mut surface = RgbaImage::from_pixel(3, 2, RED);
        Canvas::new(&mut surface).clear(TRANSPARENT);
        assert!(surface.pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn clear_respects_clip_mask() {
        let mut surface = RgbaImage::from_pixel(2, 1, RED);
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, crate::clip::INSIDE);

        let mut canvas = Canvas::new(&mut surface);
        canvas.set_clip_mask(mask).unwrap();
        canvas.clear(BLUE);
        assert!(canvas.has_clip());

        assert_eq!(*surface.get_pixel(0, 0), RED);
        assert_eq!(*surface.get_pixel(1, 0), BLUE);
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let mut surface = RgbaImage::new(4, 4);
        let mut canvas = Canvas::new(&mut surface);
        let err = canvas.set_clip_mask(GrayImage::new(2, 2)).unwrap_err();
        assert!(matches!(err, DrawError::ClipSizeMismatch { mask_width: 2, .. }));
        assert!(!canvas.has_clip());
    }

    #[test]
    fn draw_image_scales_to_target_rect() {
        let mut surface = RgbaImage::new(4, 4);
        let tile = RgbaImage::from_pixel(1, 1, BLUE);

        Canvas::new(&mut surface).draw_image(&tile, 2, 2, 2, 2).unwrap();

        assert_eq!(*surface.get_pixel(1, 1), TRANSPARENT);
        assert_eq!(*surface.get_pixel(2, 2), BLUE);
        assert_eq!(*surface.get_pixel(3, 3), BLUE);
    }

    #[test]
    fn draw_image_skips_out_of_bounds_pixels() {
        let mut surface = RgbaImage::new(2, 2);
        let tile = RgbaImage::from_pixel(2, 2, RED);

        Canvas::new(&mut surface).draw_image(&tile, -1, -1, 2, 2).unwrap();

        assert_eq!(*surface.get_pixel(0, 0), RED);
        assert_eq!(*surface.get_pixel(1, 1), TRANSPARENT);
    }

    #[test]
    fn restore_puts_back_snapshot() {
        let mut surface = RgbaImage::from_pixel(2, 2, RED);
        let mut canvas = Canvas::new(&mut surface);
        let snapshot = canvas.snapshot();
        canvas.clear(TRANSPARENT);
        assert_eq!(*canvas.surface().get_pixel(1, 1), TRANSPARENT);
        canvas.restore(&snapshot);
        assert!(surface.pixels().all(|p| *p == RED));
    }

    #[test]
    fn translucent_source_blends_over_opaque_destination() {
        let mut dst = RED;
        composite(&mut dst, &Rgba([0, 0, 255, 128]));
        assert_eq!(dst, Rgba([127, 0, 128, 255]));
    }

    #[test]
    fn translucent_over_translucent_accumulates_alpha() {
        let mut dst = Rgba([255, 0, 0, 128]);
        composite(&mut dst, &Rgba([0, 0, 255, 128]));
        // 0.502 + 0.502 * 0.498 of coverage
        assert_eq!(dst[3], 192);
        assert!(dst[2] > dst[0]);
    }

    #[test]
    fn transparent_source_leaves_destination() {
        let mut dst = RED;
        composite(&mut dst, &Rgba([0, 0, 255, 0]));
        assert_eq!(dst, RED);
    }
}
