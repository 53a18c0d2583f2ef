use geo::{Coord, Rect};
use image::imageops::{overlay, rotate270};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut, Blend,
    Canvas as _,
};
use imageproc::point::Point;
use imageproc::rect::Rect as ImageRect;
use rusttype::Scale;

use crate::error::Result;
use crate::render::colormap::Rgb;
use crate::render::font::Typeface;


/// Pixel-space rectangle, y growing downwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Maps data coordinates into a panel, keeping the aspect ratio.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    min: Coord<f64>,
    extent: (f64, f64),
    scale: f64,
    offset: (f64, f64),
    panel_bottom: f64,
}

impl Viewport {
    /// `margin` is the fraction of the data extent added on every side.
    pub fn fit(bounds: Rect<f64>, panel: PixelRect, margin: f64) -> Self {
        let mut width = bounds.width();
        let mut height = bounds.height();
        let mut min = bounds.min();

        if width <= 0.0 && height <= 0.0 {
            width = 1.0;
            height = 1.0;
            min = Coord { x: min.x - 0.5, y: min.y - 0.5 };
        } else if width <= 0.0 {
            min.x -= height / 2.0;
            width = height;
        } else if height <= 0.0 {
            min.y -= width / 2.0;
            height = width;
        }

        min = Coord { x: min.x - width * margin, y: min.y - height * margin };
        width *= 1.0 + 2.0 * margin;
        height *= 1.0 + 2.0 * margin;

        let scale = (panel.width / width).min(panel.height / height);
        let offset = (
            panel.x + (panel.width - width * scale) / 2.0,
            (panel.height - height * scale) / 2.0,
        );

        Viewport { min, extent: (width, height), scale, offset, panel_bottom: panel.y + panel.height }
    }

    pub fn to_pixel(&self, c: Coord<f64>) -> (f64, f64) {
        let x = self.offset.0 + (c.x - self.min.x) * self.scale;
        let y = self.panel_bottom - self.offset.1 - (c.y - self.min.y) * self.scale;
        (x, y)
    }

    /// The data extent (margins included) this viewport shows.
    pub fn world_bounds(&self) -> Rect<f64> {
        Rect::new(self.min, Coord { x: self.min.x + self.extent.0, y: self.min.y + self.extent.1 })
    }

    /// Where [`Viewport::world_bounds`] lands in pixels.
    pub fn pixel_bounds(&self) -> PixelRect {
        let width = self.extent.0 * self.scale;
        let height = self.extent.1 * self.scale;
        PixelRect {
            x: self.offset.0,
            y: self.panel_bottom - self.offset.1 - height,
            width,
            height,
        }
    }
}

/// An RGBA raster drawn through imageproc, with alpha-blended fills and
/// text in the embedded typeface.
pub struct Canvas {
    image: Blend<RgbaImage>,
    typeface: Typeface,
}

fn rgba(color: Rgb, alpha: f64) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// Integer vertices relative to `origin`, without repeats or a closing point.
fn mask_points(ring: &[(f64, f64)], origin: (i64, i64)) -> Vec<Point<i32>> {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(ring.len());
    for (x, y) in ring {
        let p = Point::new((x.round() as i64 - origin.0) as i32, (y.round() as i64 - origin.1) as i32);
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb) -> Result<Self> {
        Ok(Canvas {
            image: Blend(RgbaImage::from_pixel(width, height, rgba(background, 1.0))),
            typeface: Typeface::embedded()?,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.0.width()
    }

    pub fn height(&self) -> u32 {
        self.image.0.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image.0
    }

    pub fn into_image(self) -> RgbaImage {
        self.image.0
    }

    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Rgb, alpha: f64) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        self.image.draw_pixel(x as u32, y as u32, rgba(color, alpha));
    }

    /// Blends `color` wherever `mask` is set, so overlapping strokes of one
    /// shape are only blended once.
    fn composite(&mut self, mask: &GrayImage, origin: (i64, i64), color: Rgb, alpha: f64) {
        for (x, y, value) in mask.enumerate_pixels() {
            if value[0] > 0 {
                self.blend_pixel(origin.0 + x as i64, origin.1 + y as i64, color, alpha);
            }
        }
    }

    /// Pixel box covering `points`, clipped to the canvas.
    fn clipped_box(&self, points: impl Iterator<Item = (f64, f64)>) -> Option<((i64, i64), (u32, u32))> {
        let (mut x0, mut y0, mut x1, mut y1) = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in points {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return None;
        }

        let left = (x0.floor() as i64).max(0);
        let top = (y0.floor() as i64).max(0);
        let right = (x1.ceil() as i64).min(self.width() as i64 - 1);
        let bottom = (y1.ceil() as i64).min(self.height() as i64 - 1);
        if right < left || bottom < top {
            return None;
        }

        Some(((left, top), ((right - left + 1) as u32, (bottom - top + 1) as u32)))
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgb, alpha: f64) {
        let (x0, y0) = (rect.x.round() as i32, rect.y.round() as i32);
        let (x1, y1) = ((rect.x + rect.width).round() as i32, (rect.y + rect.height).round() as i32);
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        let area = ImageRect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32);
        draw_filled_rect_mut(&mut self.image, area, rgba(color, alpha));
    }

    /// Fills the first ring and leaves the following rings (holes) empty.
    /// Rings need not be closed.
    pub fn fill_polygon(&mut self, rings: &[Vec<(f64, f64)>], color: Rgb, alpha: f64) {
        let exterior = match rings.first() {
            Some(ring) => ring,
            None => return,
        };
        let (origin, (width, height)) = match self.clipped_box(exterior.iter().copied()) {
            Some(bounds) => bounds,
            None => return,
        };

        let mut mask = GrayImage::new(width, height);
        for (i, ring) in rings.iter().enumerate() {
            let value = Luma([if i == 0 { 255 } else { 0 }]);
            let points = mask_points(ring, origin);
            match points.len() {
                0 => {}
                1 | 2 if i == 0 => {
                    let (a, b) = (points[0], points[points.len() - 1]);
                    draw_line_segment_mut(&mut mask, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), value);
                }
                1 | 2 => {}
                _ => draw_polygon_mut(&mut mask, &points, value),
            }
        }

        self.composite(&mask, origin, color, alpha);
    }

    pub fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Rgb, alpha: f64) {
        let r = radius.round().max(0.0) as i32;
        let origin = (center.0.round() as i64 - r as i64, center.1.round() as i64 - r as i64);
        let size = 2 * r as u32 + 1;

        let mut mask = GrayImage::new(size, size);
        draw_filled_circle_mut(&mut mask, (r, r), r, Luma([255]));
        self.composite(&mask, origin, color, alpha);
    }

    /// Segment `width` pixels wide, thick ones get a round cap.
    pub fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgb, alpha: f64) {
        let half = width / 2.0;
        if half <= 0.75 {
            draw_line_segment_mut(
                &mut self.image,
                (from.0 as f32, from.1 as f32),
                (to.0 as f32, to.1 as f32),
                rgba(color, alpha),
            );
            return;
        }

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        if length > 0.0 {
            let (nx, ny) = (-dy / length * half, dx / length * half);
            let quad = vec![
                (from.0 + nx, from.1 + ny),
                (to.0 + nx, to.1 + ny),
                (to.0 - nx, to.1 - ny),
                (from.0 - nx, from.1 - ny),
            ];
            self.fill_polygon(&[quad], color, alpha);
        }
        if half > 1.0 {
            self.fill_circle(to, half, color, alpha);
        }
    }

    pub fn draw_path(&mut self, points: &[(f64, f64)], width: f64, color: Rgb, alpha: f64) {
        for pair in points.windows(2) {
            self.draw_line(pair[0], pair[1], width, color, alpha);
        }
    }

    /// Draws `text` left to right with the top left of its line box at `origin`.
    pub fn draw_text(&mut self, text: &str, origin: (f64, f64), scale: Scale, color: Rgb, bold: bool) {
        let face = self.typeface.face(bold);
        let (x, y) = (origin.0.round() as i32, origin.1.round() as i32);
        draw_text_mut(&mut self.image, rgba(color, 1.0), x, y, scale, face, text);
    }

    /// Draws `text` turned a quarter counter-clockwise, reading bottom to top
    /// from `origin` (the bottom left corner of the rotated box).
    pub fn draw_text_up(&mut self, text: &str, origin: (f64, f64), scale: Scale, color: Rgb) {
        let width = self.typeface.text_width(text, scale).ceil().max(1.0) as u32;
        let height = self.typeface.text_height(scale).ceil().max(1.0) as u32;

        let mut label = RgbaImage::from_pixel(width, height, rgba(color, 0.0));
        draw_text_mut(&mut label, rgba(color, 1.0), 0, 0, scale, self.typeface.face(false), text);

        let rotated = rotate270(&label);
        let (x, y) = (origin.0.round() as i64, origin.1.round() as i64 - width as i64);
        overlay(&mut self.image.0, &rotated, x, y);
    }
}
