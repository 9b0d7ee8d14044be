//! Conversion entry points.
//!
//! [`Converter::convert`] never fails: every error is folded into a
//! [`ConversionResult`] whose `error` explains what went wrong. The steps of a
//! single call run strictly in order (load, read, render, encode, package)
//! with no retries and no timeout.

use crate::config::ConversionConfig;
use crate::error::Pdf2ImgError;
use crate::loader::LibraryLoader;
use crate::object_url::ObjectUrlRegistry;
use crate::output::{output_file_name, ConversionResult, ImageFile, BLOB_ERROR};
use crate::pipeline::encode::{ImageEncoder, PngEncoder};
use crate::pipeline::input::PdfFile;
use crate::pipeline::render;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Drives the loader and the render pipeline for one PDF at a time.
///
/// Cheap to share: clone it or put it behind an `Arc`. Every clone uses the
/// same loader, so the library is still imported only once.
#[derive(Clone)]
pub struct Converter {
    loader: Arc<LibraryLoader>,
    encoder: Arc<dyn ImageEncoder>,
    urls: Arc<ObjectUrlRegistry>,
    config: ConversionConfig,
}

static GLOBAL: Lazy<Converter> = Lazy::new(|| Converter::new(LibraryLoader::global()));

impl Converter {
    /// A PNG converter on top of `loader`, registering URLs globally.
    pub fn new(loader: Arc<LibraryLoader>) -> Self {
        Self {
            loader,
            encoder: Arc::new(PngEncoder),
            urls: ObjectUrlRegistry::global(),
            config: ConversionConfig::default(),
        }
    }

    /// The converter behind [`convert_pdf_to_image`].
    pub fn global() -> &'static Converter {
        &GLOBAL
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn ImageEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_url_registry(mut self, urls: Arc<ObjectUrlRegistry>) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_config(mut self, config: ConversionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn loader(&self) -> &Arc<LibraryLoader> {
        &self.loader
    }

    pub fn url_registry(&self) -> &Arc<ObjectUrlRegistry> {
        &self.urls
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Render the first page of `file` as an image.
    ///
    /// On success the returned `image_url` is registered in this converter's
    /// [`ObjectUrlRegistry`] and must be revoked by the caller.
    pub async fn convert(&self, file: &PdfFile) -> ConversionResult {
        let start = Instant::now();
        info!("Starting PDF conversion for file: {}", file.name());

        match self.render(file).await {
            Ok(Some(bytes)) if !bytes.is_empty() => {
                let result = self.package(file, bytes);
                info!(
                    "Converted {} in {}ms",
                    file.name(),
                    start.elapsed().as_millis()
                );
                result
            }
            Ok(_) => {
                error!("{}", BLOB_ERROR);
                ConversionResult::failure(BLOB_ERROR)
            }
            Err(e) => {
                error!("PDF conversion error: {}", e);
                ConversionResult::failure(format!("Failed to convert PDF: {e}"))
            }
        }
    }

    /// Load the library, read the file, then render and encode off the
    /// async executor.
    async fn render(&self, file: &PdfFile) -> Result<Option<Vec<u8>>, Pdf2ImgError> {
        let library = self.loader.ensure_loaded().await?;
        info!("PDF library {} loaded", library.version());

        let bytes = file.read_bytes().await?;

        let encoder = Arc::clone(&self.encoder);
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            render::render_first_page(library.as_ref(), &bytes, &config, encoder.as_ref())
        })
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Render task panicked: {}", e)))?
    }

    /// Wrap encoded bytes as a file and an object URL over the same buffer.
    fn package(&self, file: &PdfFile, bytes: Vec<u8>) -> ConversionResult {
        let bytes: Arc<[u8]> = bytes.into();
        let image = ImageFile::new(
            output_file_name(file.name()),
            self.encoder.media_type(),
            Arc::clone(&bytes),
        );
        let url = self.urls.create(bytes);
        info!("Image blob created, size: {}", image.len());
        ConversionResult::success(url, image)
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("loader", &self.loader)
            .field("encoder", &self.encoder.media_type())
            .field("config", &self.config)
            .finish()
    }
}

/// Convert the first page of `file` with the process-wide PDFium converter.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2img::{convert_pdf_to_image, revoke_object_url, PdfFile};
///
/// # #[tokio::main]
/// # async fn main() {
/// let result = convert_pdf_to_image(&PdfFile::from_path("invoice.pdf")).await;
/// match (&result.file, &result.error) {
///     (Some(file), None) => println!("{} ({} bytes)", file.name(), file.len()),
///     (_, Some(err)) => eprintln!("{err}"),
///     _ => unreachable!(),
/// }
/// revoke_object_url(&result.image_url);
/// # }
/// ```
pub async fn convert_pdf_to_image(file: &PdfFile) -> ConversionResult {
    Converter::global().convert(file).await
}

/// Synchronous wrapper around [`convert_pdf_to_image`].
///
/// Creates a temporary tokio runtime internally; do not call it from inside
/// an async context.
pub fn convert_sync(file: &PdfFile) -> ConversionResult {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(convert_pdf_to_image(file)),
        Err(e) => ConversionResult::failure(format!(
            "Failed to convert PDF: {}",
            Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {e}"))
        )),
    }
}
