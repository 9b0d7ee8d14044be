//! Configuration types for first-page conversion.
//!
//! Two structs, because they have different lifetimes:
//!
//! * [`LoaderConfig`] is consumed once, when the rendering library is first
//!   loaded, and decides where the library's worker comes from.
//! * [`ConversionConfig`] is read on every call to
//!   [`crate::convert::Converter::convert`].
//!
//! The render scale is deliberately *not* a knob: pages are always rendered at
//! [`RENDER_SCALE`].

use crate::error::Pdf2ImgError;
use std::path::PathBuf;

/// Scale applied to the page's native size (in PDF points) when rendering.
pub const RENDER_SCALE: f32 = 4.0;

/// Media type of every image this crate produces.
pub const OUTPUT_MEDIA_TYPE: &str = "image/png";

/// Largest canvas (in pixels) a drawing context is handed out for.
///
/// Matches the 16384 × 16384 ceiling browsers apply to 2D canvases.
pub const DEFAULT_MAX_CANVAS_AREA: u64 = 16_384 * 16_384;

/// Configuration for a first-page conversion.
///
/// # Example
/// ```rust
/// use edgequake_pdf2img::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .image_quality(1.0)
///     .max_canvas_area(8192 * 8192)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// Quality hint handed to the encoder, 0.0–1.0. Default: 1.0.
    ///
    /// PNG is lossless so the bundled encoder ignores it; custom encoders may not.
    pub image_quality: f32,

    /// Maximum canvas area in pixels. Default: [`DEFAULT_MAX_CANVAS_AREA`].
    ///
    /// A page whose 4× viewport exceeds this gets no drawing context and the
    /// conversion fails with [`Pdf2ImgError::ContextUnavailable`].
    pub max_canvas_area: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            image_quality: 1.0,
            max_canvas_area: DEFAULT_MAX_CANVAS_AREA,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn image_quality(mut self, q: f32) -> Self {
        self.config.image_quality = q;
        self
    }

    pub fn max_canvas_area(mut self, px: u64) -> Self {
        self.config.max_canvas_area = px;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImgError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.image_quality) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "Image quality must be 0.0–1.0, got {}",
                c.image_quality
            )));
        }
        if c.max_canvas_area == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "Maximum canvas area must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Where the rendering library's worker is loaded from.
///
/// `fallback_url_template` must contain `{version}`; it is replaced with the
/// loaded library's own version so the worker always matches the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Preferred, local worker location.
    pub local_worker_src: PathBuf,
    /// Remote worker URL used when the local one cannot be assigned.
    pub fallback_url_template: String,
}

impl LoaderConfig {
    pub fn new(local_worker_src: impl Into<PathBuf>, fallback_url_template: impl Into<String>) -> Self {
        Self {
            local_worker_src: local_worker_src.into(),
            fallback_url_template: fallback_url_template.into(),
        }
    }

    /// Worker locations for the bundled PDFium backend.
    ///
    /// Local: `PDFIUM_LIB_PATH` or the per-version cache. Remote: the matching
    /// `pdfium-binaries` release archive. Unsupported platforms fail at import,
    /// before either location is used.
    pub fn pdfium_default() -> Self {
        let local = pdfium_source::local_library_path()
            .unwrap_or_else(|_| pdfium_source::cache_dir(pdfium_source::PDFIUM_VERSION));
        let remote = pdfium_source::release_url_template().unwrap_or_default();
        Self::new(local, remote)
    }

    /// The fallback URL for a library reporting `version`.
    pub fn fallback_url(&self, version: &str) -> String {
        pdfium_source::expand_template(&self.fallback_url_template, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = ConversionConfig::builder().build().unwrap();
        assert_eq!(c, ConversionConfig::default());
        assert_eq!(c.image_quality, 1.0);
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        let err = ConversionConfig::builder()
            .image_quality(1.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::InvalidConfig(_)));
    }

    #[test]
    fn zero_canvas_area_is_rejected() {
        assert!(ConversionConfig::builder().max_canvas_area(0).build().is_err());
    }

    #[test]
    fn fallback_url_substitutes_version() {
        let cfg = LoaderConfig::new("/worker.so", "https://cdn.example/lib@{version}/worker");
        assert_eq!(cfg.fallback_url("4.2.0"), "https://cdn.example/lib@4.2.0/worker");
    }
}
