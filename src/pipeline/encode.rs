//! Image encoding: [`Canvas`] → PNG bytes.
//!
//! PNG is lossless, so text stays crisp at any zoom level; the `quality`
//! argument is accepted for interface parity with lossy encoders and ignored.

use crate::config::OUTPUT_MEDIA_TYPE;
use crate::error::Pdf2ImgError;
use crate::pipeline::render::Canvas;
use std::io::Cursor;
use tracing::debug;

/// Turns a rendered canvas into encoded image bytes.
pub trait ImageEncoder: Send + Sync {
    /// Media type of the produced bytes, e.g. `image/png`.
    fn media_type(&self) -> &'static str;

    /// Encode `canvas`.
    ///
    /// `Ok(None)` means "nothing to encode" (an undrawable canvas) and is
    /// reported to the caller differently from an encoder failure.
    fn encode(&self, canvas: &Canvas, quality: f32) -> Result<Option<Vec<u8>>, Pdf2ImgError>;
}

/// The default encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn media_type(&self) -> &'static str {
        OUTPUT_MEDIA_TYPE
    }

    fn encode(&self, canvas: &Canvas, _quality: f32) -> Result<Option<Vec<u8>>, Pdf2ImgError> {
        let Some(pixels) = canvas.pixels() else {
            return Ok(None);
        };

        let mut buf = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| Pdf2ImgError::EncodeFailed(e.to_string()))?;

        debug!("Encoded canvas → {} bytes PNG", buf.len());
        Ok(Some(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    #[test]
    fn encode_small_canvas() {
        let mut canvas = Canvas::new(10, 10, 1_000);
        let red = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        canvas.draw_image(DynamicImage::ImageRgba8(red)).unwrap();

        let png = PngEncoder.encode(&canvas, 1.0).unwrap().expect("some bytes");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).expect("valid PNG");
        assert_eq!(decoded.width(), 10);
        assert_eq!(decoded.to_rgba8().get_pixel(9, 9), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn undrawable_canvas_encodes_to_nothing() {
        let canvas = Canvas::new(0, 0, 1_000);
        assert!(PngEncoder.encode(&canvas, 1.0).unwrap().is_none());
    }

    #[test]
    fn media_type_is_png() {
        assert_eq!(PngEncoder.media_type(), "image/png");
    }
}
