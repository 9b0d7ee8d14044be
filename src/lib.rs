//! # edgequake-pdf2img
//!
//! Render the first page of a PDF document to a PNG image.
//!
//! The result comes back twice over the same bytes: as an owned
//! [`ImageFile`] you can save or upload, and as an object URL
//! (`blob:pdf2img/…`) you can hand to a preview and must revoke afterwards.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Load    import PDFium once per process, pick its worker (local or release)
//!  ├─ 2. Input   read the whole file into memory
//!  ├─ 3. Render  page 1 at 4× onto a canvas (blocking, spawn_blocking)
//!  ├─ 4. Encode  canvas → PNG
//!  └─ 5. Output  ImageFile "<name>.png" + object URL over the same bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2img::{convert_pdf_to_image, revoke_object_url, PdfFile};
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = convert_pdf_to_image(&PdfFile::from_path("report.pdf")).await;
//!     if let Some(err) = &result.error {
//!         eprintln!("{err}");
//!         return;
//!     }
//!     let file = result.file.as_ref().unwrap();
//!     println!("{} → {} bytes at {}", file.name(), file.len(), result.image_url);
//!     revoke_object_url(&result.image_url);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## PDFium
//!
//! The PDFium shared library is looked up at `PDFIUM_LIB_PATH`, then in the
//! per-version cache. If neither exists the matching release archive is
//! downloaded into the cache the first time a document is rendered.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod library;
pub mod loader;
pub mod object_url;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, LoaderConfig, RENDER_SCALE};
pub use convert::{convert_pdf_to_image, convert_sync, Converter};
pub use error::Pdf2ImgError;
pub use library::{PdfLibrary, PdfPage, Viewport, WorkerSource};
pub use loader::{configure_worker, LibraryImporter, LibraryLoader, WorkerSetup};
pub use object_url::{create_object_url, revoke_object_url, ObjectUrlRegistry};
pub use output::{output_file_name, ConversionResult, ImageFile, BLOB_ERROR};
pub use pipeline::encode::{ImageEncoder, PngEncoder};
pub use pipeline::input::PdfFile;
pub use pipeline::render::{Canvas, DrawingContext, SmoothingQuality};
