//! Closed outlines used as clip regions.
//!
//! Arcs follow the usual raster convention: angles in degrees, 0° points
//! along +x, and positive sweeps turn clockwise on screen because y grows
//! downwards. An arc is described by the bounding box of its ellipse.
//!
//! Outlines live in continuous surface coordinates, where pixel `(x, y)`
//! covers `[x, x + 1) × [y, y + 1)`. [`ClipPath::rasterize`] samples them
//! at pixel centres into a coverage mask.

use image::{GrayImage, Luma};

use crate::error::DrawError;

/// Segments used to flatten a quarter turn.
const SEGMENTS_PER_QUARTER: f32 = 16.0;

pub const INSIDE: Luma<u8> = Luma([255]);
pub const OUTSIDE: Luma<u8> = Luma([0]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Default)]
pub struct ClipPathBuilder {
    points: Vec<(f32, f32)>,
}

impl ClipPathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an elliptical arc inscribed in `bounds`. The outline is
    /// joined to the previous figure with a straight edge.
    pub fn add_arc(&mut self, bounds: RectF, start_angle: f32, sweep_angle: f32) -> &mut Self {
        let (cx, cy) = bounds.center();
        let (rx, ry) = (bounds.width / 2.0, bounds.height / 2.0);
        let steps = ((sweep_angle.abs() / 90.0) * SEGMENTS_PER_QUARTER)
            .ceil()
            .max(1.0) as usize;

        for step in 0..=steps {
            let angle = (start_angle + sweep_angle * step as f32 / steps as f32).to_radians();
            self.points.push((cx + rx * angle.cos(), cy + ry * angle.sin()));
        }
        self
    }

    pub fn close(self) -> ClipPath {
        ClipPath {
            points: self.points,
        }
    }
}

/// A closed polygonal outline.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    points: Vec<(f32, f32)>,
}

impl ClipPath {
    /// Rounded rectangle spanning `width × height` with four quarter arcs.
    pub fn rounded_rect(width: f32, height: f32, radius: f32) -> ClipPath {
        let d = radius * 2.0;
        let mut builder = ClipPathBuilder::new();
        builder
            .add_arc(RectF::new(0.0, 0.0, d, d), 180.0, 90.0)
            .add_arc(RectF::new(width - d, 0.0, d, d), 270.0, 90.0)
            .add_arc(RectF::new(width - d, height - d, d, d), 0.0, 90.0)
            .add_arc(RectF::new(0.0, height - d, d, d), 90.0, 90.0);
        builder.close()
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    /// Fill the outline into a `width × height` mask, [`INSIDE`] where the
    /// pixel centre falls in the path (even-odd rule).
    pub fn rasterize(&self, width: u32, height: u32) -> Result<GrayImage, DrawError> {
        if width == 0 || height == 0 {
            return Err(DrawError::EmptySurface);
        }

        let distinct = self.distinct_points();
        if distinct < 3 {
            return Err(DrawError::DegeneratePath { points: distinct });
        }

        let mut mask = GrayImage::from_pixel(width, height, OUTSIDE);
        let mut crossings = Vec::new();
        for y in 0..height {
            self.row_crossings(y as f32 + 0.5, &mut crossings);
            for span in crossings.chunks_exact(2) {
                let first = first_centre_at_or_after(span[0], width);
                let end = first_centre_at_or_after(span[1], width);
                for x in first..end {
                    mask.put_pixel(x, y, INSIDE);
                }
            }
        }
        Ok(mask)
    }

    fn distinct_points(&self) -> usize {
        let mut points: Vec<(u32, u32)> = self
            .points
            .iter()
            .map(|&(x, y)| ((x + 0.0).to_bits(), (y + 0.0).to_bits()))
            .collect();
        points.sort_unstable();
        points.dedup();
        points.len()
    }

    /// Sorted x positions where the horizontal line through `y` crosses the
    /// implicitly closed outline.
    fn row_crossings(&self, y: f32, crossings: &mut Vec<f32>) {
        crossings.clear();
        let count = self.points.len();
        for i in 0..count {
            let (x0, y0) = self.points[i];
            let (x1, y1) = self.points[(i + 1) % count];
            if (y0 > y) != (y1 > y) {
                crossings.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
            }
        }
        crossings.sort_by(f32::total_cmp);
    }
}

/// Index of the first pixel whose centre lies at or right of `x`, clamped
/// to `[0, width]`.
fn first_centre_at_or_after(x: f32, width: u32) -> u32 {
    (x - 0.5).ceil().clamp(0.0, width as f32) as u32
}
