//! End-to-end tests for edgequake-pdf2img against a real PDFium.
//!
//! These tests bind (and possibly download) the PDFium shared library, so
//! they are gated behind the `E2E_ENABLED` environment variable and do not
//! run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Use an existing library instead of downloading one:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/opt/pdfium/lib/libpdfium.so cargo test --test e2e

use edgequake_pdf2img::{convert_pdf_to_image, revoke_object_url, ObjectUrlRegistry, PdfFile};

// ── Test helpers ─────────────────────────────────────────────────────────────

macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

/// A valid PDF whose pages all have a `width` × `height` pt media box.
fn minimal_pdf(width: u32, height: u32, pages: usize) -> Vec<u8> {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        {
            let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 3)).collect();
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                pages
            )
        },
    ];
    for _ in 0..pages {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] >>"
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_at = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for off in offsets {
        xref.push_str(&format!("{off:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_page_rendered_at_four_times_scale() {
    e2e_skip_unless_enabled!();

    let file = PdfFile::from_bytes("sample.pdf", minimal_pdf(200, 100, 3));
    let result = convert_pdf_to_image(&file).await;
    assert!(result.is_success(), "conversion failed: {:?}", result.error);

    let image = result.file.as_ref().unwrap();
    assert_eq!(image.name(), "sample.png");
    assert_eq!(image.media_type(), "image/png");

    let decoded = image::load_from_memory(image.bytes()).expect("PNG should decode");
    assert_eq!((decoded.width(), decoded.height()), (800, 400));

    let aliased = ObjectUrlRegistry::global()
        .resolve(&result.image_url)
        .expect("URL should be registered");
    assert_eq!(&aliased[..], image.bytes());

    assert!(revoke_object_url(&result.image_url));
}

#[tokio::test]
async fn test_written_png_matches_file_bytes() {
    e2e_skip_unless_enabled!();

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("Letter.PDF");
    std::fs::write(&input, minimal_pdf(612, 792, 1)).unwrap();

    let result = convert_pdf_to_image(&PdfFile::from_path(&input)).await;
    let image = result.file.as_ref().expect("conversion should succeed");
    assert_eq!(image.name(), "Letter.png");

    let out = dir.path().join(image.name());
    image.write_to(&out).await.unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), image.bytes());

    revoke_object_url(&result.image_url);
}

#[tokio::test]
async fn test_garbage_input_reports_failure() {
    e2e_skip_unless_enabled!();

    let file = PdfFile::from_bytes("junk.pdf", b"this is not a pdf".to_vec());
    let result = convert_pdf_to_image(&file).await;

    assert_eq!(result.image_url, "");
    assert!(result.file.is_none());
    let err = result.error.expect("error expected");
    assert!(err.starts_with("Failed to convert PDF:"), "got: {err}");
    assert!(err.contains("PDF is corrupt"), "got: {err}");
}

#[tokio::test]
async fn test_zero_page_document_reports_failure() {
    e2e_skip_unless_enabled!();

    let file = PdfFile::from_bytes("empty.pdf", minimal_pdf(200, 100, 0));
    let result = convert_pdf_to_image(&file).await;

    assert!(result.file.is_none());
    let err = result.error.expect("error expected");
    assert!(err.contains("0 pages"), "got: {err}");
}
