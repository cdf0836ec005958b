//! Raster encoders

use std::io;

use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};

pub const JPEG_QUALITY: u8 = 100;

pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// Composite `image` over an opaque background, dropping alpha
pub fn flatten_rgb(image: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let a = u16::from(a);
        let blend = |c: u8, bg: u8| ((u16::from(c) * a + u16::from(bg) * (255 - a) + 127) / 255) as u8;
        image::Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

pub fn write_jpeg<W: io::Write>(w: W, image: &RgbImage) -> image::ImageResult<()> {
    let mut encoder = JpegEncoder::new_with_quality(w, JPEG_QUALITY);
    encoder.encode_image(image)
}
