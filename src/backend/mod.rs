//! Rendering backends implementing [`crate::library::PdfLibrary`].

pub mod pdfium;
