//! Text rendering with the embedded DejaVu Sans faces.

use rusttype::{point, Font, Scale};

use crate::error::{Error, Result};
use crate::render::encode::DPI;

const REGULAR: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
const BOLD: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::render::font::Typeface;

    #[test]
    fn embedded_faces_parse() {
        assert!(Typeface::embedded().is_ok());
    }

    #[rstest]
    #[case(12.0, 50.0)]
    #[case(16.0, 66.666)]
    fn points_map_to_pixels_at_the_output_dpi(#[case] points: f64, #[case] pixels: f32) {
        let scale = Typeface::scale_for_points(points);
        assert!((scale.y - pixels).abs() < 0.01);
    }

    #[test]
    fn width_grows_with_the_text() {
        let typeface = Typeface::embedded().unwrap();
        let scale = Typeface::scale_for_points(12.0);

        assert_eq!(0.0, typeface.text_width("", scale));
        let short = typeface.text_width("Oak", scale);
        let long = typeface.text_width("Oak Savanna", scale);
        assert!(short > 0.0 && long > short);
        assert!(typeface.text_width("W", scale) > typeface.text_width("i", scale));
    }

    #[test]
    fn height_follows_the_scale() {
        let typeface = Typeface::embedded().unwrap();
        let small = typeface.text_height(Typeface::scale_for_points(10.0));
        let large = typeface.text_height(Typeface::scale_for_points(20.0));

        assert!((large / small - 2.0).abs() < 0.01);
    }
}

/// Regular and bold faces used for every label on a figure.
#[derive(Clone)]
pub struct Typeface {
    regular: Font<'static>,
    bold: Font<'static>,
}

impl Typeface {
    pub fn embedded() -> Result<Self> {
        let parse = |bytes: &'static [u8]| {
            Font::try_from_bytes(bytes).ok_or_else(|| Error::Unsupported("Embedded font can't be parsed".to_string()))
        };

        Ok(Typeface { regular: parse(REGULAR)?, bold: parse(BOLD)? })
    }

    /// Pixel scale of a font size given in points.
    pub fn scale_for_points(points: f64) -> Scale {
        Scale::uniform((points * DPI as f64 / 72.0) as f32)
    }

    pub fn face(&self, bold: bool) -> &Font<'static> {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    pub fn text_width(&self, text: &str, scale: Scale) -> f64 {
        self.regular
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| (g.position().x + g.unpositioned().h_metrics().advance_width) as f64)
            .unwrap_or(0.0)
    }

    /// Ascent to descent, the box `draw_text` fills below its origin.
    pub fn text_height(&self, scale: Scale) -> f64 {
        let metrics = self.regular.v_metrics(scale);
        (metrics.ascent - metrics.descent) as f64
    }
}
