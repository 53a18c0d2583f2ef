use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::Path;

use image::RgbaImage;
use png::{BitDepth, ColorType, Encoder, PixelDimensions, Unit};

use crate::error::Result;

pub const DPI: u32 = 300;


fn pixels_per_meter(dpi: u32) -> u32 {
    (dpi as f64 / 0.0254).round() as u32
}

/// Writes an RGBA raster as PNG, tagged with 300 DPI and a `Title` text chunk.
///
/// Missing parent directories are created.
pub fn encode_png(file_path: &Path, img: &RgbaImage, title: &str) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        create_dir_all(parent)?;
    }

    let file = File::create(file_path)?;
    let buf = BufWriter::new(file);

    let mut encoder = Encoder::new(buf, img.width(), img.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let ppm = pixels_per_meter(DPI);
    encoder.set_pixel_dims(Some(PixelDimensions { xppu: ppm, yppu: ppm, unit: Unit::Meter }));

    if title.chars().all(|c| (c as u32) < 256) {
        encoder.add_text_chunk("Title".to_string(), title.to_string())?;
    } else {
        encoder.add_itxt_chunk("Title".to_string(), title.to_string())?;
    }

    let mut writer = encoder.write_header()?;
    writer.write_image_data(img.as_raw())?;
    writer.finish()?;

    Ok(())
}
