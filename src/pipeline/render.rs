//! Rasterisation: draw page one of a document onto an in-memory [`Canvas`].
//!
//! ## Why a canvas with a separate drawing context?
//!
//! The canvas is allocated to the exact pixel size of the page's viewport, but
//! a canvas is not guaranteed to be drawable: above
//! [`crate::config::ConversionConfig::max_canvas_area`] (or at zero size) no
//! [`DrawingContext`] is handed out. Rendering without a context can only
//! produce garbage, so that case is a hard error here rather than something to
//! push through and fail on later.
//!
//! Everything in this module is blocking: call [`render_first_page`] from
//! `spawn_blocking`.

use crate::config::{ConversionConfig, RENDER_SCALE};
use crate::error::Pdf2ImgError;
use crate::library::{PdfLibrary, PdfPage};
use crate::pipeline::encode::ImageEncoder;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// How hard the renderer tries when smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingQuality {
    #[default]
    Low,
    Medium,
    High,
}

/// Drawing state of a [`Canvas`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawingContext {
    pub image_smoothing_enabled: bool,
    pub image_smoothing_quality: SmoothingQuality,
}

/// A fixed-size RGBA raster surface.
#[derive(Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    context: Option<DrawingContext>,
    pixels: Option<RgbaImage>,
}

impl Canvas {
    /// Allocate a `width` × `height` canvas.
    ///
    /// Zero-sized canvases and canvases larger than `max_area` pixels are
    /// created without storage or a drawing context.
    pub fn new(width: u32, height: u32, max_area: u64) -> Self {
        let area = width as u64 * height as u64;
        let drawable = area > 0 && area <= max_area;
        Self {
            width,
            height,
            context: drawable.then(DrawingContext::default),
            pixels: drawable.then(|| RgbaImage::new(width, height)),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The drawing context, or `None` if this canvas cannot be drawn on.
    pub fn context_2d(&mut self) -> Option<&mut DrawingContext> {
        self.context.as_mut()
    }

    pub fn context(&self) -> Option<&DrawingContext> {
        self.context.as_ref()
    }

    /// Current pixel data; `None` for an undrawable canvas.
    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }

    /// Copy `image` onto the canvas at the origin, clipping to canvas bounds.
    pub fn draw_image(&mut self, image: DynamicImage) -> Result<(), Pdf2ImgError> {
        let Some(pixels) = self.pixels.as_mut() else {
            return Err(Pdf2ImgError::ContextUnavailable {
                width: self.width,
                height: self.height,
            });
        };

        let image = image.into_rgba8();
        if image.dimensions() == pixels.dimensions() {
            *pixels = image;
        } else {
            debug!(
                "Drawing {}x{} image onto {}x{} canvas",
                image.width(),
                image.height(),
                self.width,
                self.height
            );
            image::imageops::replace(pixels, &image, 0, 0);
        }
        Ok(())
    }
}

/// Render page one of `bytes` and encode it.
///
/// Returns `Ok(None)` when the encoder produced no data.
pub fn render_first_page(
    library: &dyn PdfLibrary,
    bytes: &[u8],
    config: &ConversionConfig,
    encoder: &dyn ImageEncoder,
) -> Result<Option<Vec<u8>>, Pdf2ImgError> {
    let mut rendered: Option<Canvas> = None;

    library.with_page(bytes, 0, &mut |page: &dyn PdfPage| -> Result<(), Pdf2ImgError> {
        debug!("First page loaded");
        rendered = Some(draw_page(page, config)?);
        Ok(())
    })?;

    let canvas = rendered.ok_or_else(|| {
        Pdf2ImgError::Internal("renderer returned without visiting the page".into())
    })?;

    encoder.encode(&canvas, config.image_quality)
}

/// Size a canvas to the page's viewport at [`RENDER_SCALE`] and draw on it.
fn draw_page(page: &dyn PdfPage, config: &ConversionConfig) -> Result<Canvas, Pdf2ImgError> {
    let viewport = page.viewport(RENDER_SCALE);
    let mut canvas = Canvas::new(
        viewport.pixel_width(),
        viewport.pixel_height(),
        config.max_canvas_area,
    );
    debug!(
        "Canvas created with dimensions: {} x {}",
        canvas.width(),
        canvas.height()
    );

    let (width, height) = (canvas.width(), canvas.height());
    let ctx = canvas
        .context_2d()
        .ok_or(Pdf2ImgError::ContextUnavailable { width, height })?;
    ctx.image_smoothing_enabled = true;
    ctx.image_smoothing_quality = SmoothingQuality::High;

    page.render(&mut canvas, &viewport)?;
    debug!("Page rendered to canvas");

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Viewport;
    use image::Rgba;

    #[test]
    fn canvas_is_transparent_when_created() {
        let canvas = Canvas::new(3, 2, 100);
        let px = canvas.pixels().unwrap();
        assert_eq!(px.dimensions(), (3, 2));
        assert!(px.pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn zero_sized_canvas_has_no_context() {
        let mut canvas = Canvas::new(0, 10, 100);
        assert!(canvas.context_2d().is_none());
        assert!(canvas.pixels().is_none());
    }

    #[test]
    fn oversized_canvas_has_no_context() {
        let mut canvas = Canvas::new(11, 10, 100);
        assert!(canvas.context_2d().is_none());
    }

    #[test]
    fn draw_clips_to_canvas() {
        let mut canvas = Canvas::new(2, 2, 100);
        let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        canvas.draw_image(DynamicImage::ImageRgba8(red)).unwrap();
        assert!(canvas
            .pixels()
            .unwrap()
            .pixels()
            .all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    struct SolidPage {
        width_pts: f32,
        height_pts: f32,
    }

    impl PdfPage for SolidPage {
        fn viewport(&self, scale: f32) -> Viewport {
            Viewport::from_points(self.width_pts, self.height_pts, scale)
        }

        fn render(&self, canvas: &mut Canvas, _viewport: &Viewport) -> Result<(), Pdf2ImgError> {
            let ctx = canvas.context().copied().unwrap();
            assert!(ctx.image_smoothing_enabled);
            assert_eq!(ctx.image_smoothing_quality, SmoothingQuality::High);
            let img = RgbaImage::from_pixel(canvas.width(), canvas.height(), Rgba([0, 0, 255, 255]));
            canvas.draw_image(DynamicImage::ImageRgba8(img))
        }
    }

    #[test]
    fn page_is_drawn_at_four_times_native_size() {
        let page = SolidPage {
            width_pts: 10.0,
            height_pts: 5.5,
        };
        let canvas = draw_page(&page, &ConversionConfig::default()).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (40, 22));
        assert_eq!(canvas.pixels().unwrap().get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn page_too_large_for_canvas_is_an_error() {
        let page = SolidPage {
            width_pts: 100.0,
            height_pts: 100.0,
        };
        let config = ConversionConfig::builder()
            .max_canvas_area(1000)
            .build()
            .unwrap();
        let err = draw_page(&page, &config).unwrap_err();
        assert!(
            matches!(err, Pdf2ImgError::ContextUnavailable { width: 400, height: 400 }),
            "got: {err}"
        );
    }
}
