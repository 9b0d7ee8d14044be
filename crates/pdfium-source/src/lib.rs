//! # pdfium-source
//!
//! Decide where the [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library comes from, and fetch it when it is not already on disk.
//!
//! A PDFium library can come from two places:
//!
//! 1. **Local**: `PDFIUM_LIB_PATH`, or the per-version cache directory
//!    (`~/.cache/pdf2img/pdfium-{VERSION}/`). See [`local_library_path`].
//! 2. **Release**: the versioned `.tgz` published by
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries).
//!    [`release_url_template`] yields the URL with a `{version}` placeholder,
//!    [`fetch_library`] downloads and extracts it into the cache.
//!
//! Binding the resolved file into a [`Pdfium`] instance is [`bind`].
//!
//! ## Platform support
//!
//! | OS      | Arch    | Library               |
//! |---------|---------|-----------------------|
//! | macOS   | arm64   | `libpdfium.dylib`     |
//! | macOS   | x86_64  | `libpdfium.dylib`     |
//! | Linux   | x86_64  | `libpdfium.so`        |
//! | Linux   | aarch64 | `libpdfium.so`        |
//! | Windows | x86_64  | `pdfium.dll`          |
//! | Windows | aarch64 | `pdfium.dll`          |
//! | Windows | x86     | `pdfium.dll`          |
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH`: path to an existing pdfium library.
//! - `PDFIUM_CACHE_DIR`: override the default cache directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info};

// ── Public constants ─────────────────────────────────────────────────────────

/// The pdfium-binaries release tag this crate targets.
pub const PDFIUM_VERSION: &str = "7690";

/// Placeholder substituted by [`expand_template`].
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// GitHub release base URL.
const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfium-source operations.
#[derive(Error, Debug)]
pub enum PdfiumSourceError {
    /// The current OS/architecture combination has no published binary.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// gzip/tar extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform metadata ────────────────────────────────────────────────────────

/// Release asset layout for one OS/architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Asset filename in the GitHub release, e.g. `pdfium-mac-arm64.tgz`.
    pub archive_name: &'static str,
    /// Relative path inside the archive, e.g. `lib/libpdfium.dylib`.
    pub lib_path_in_archive: &'static str,
    /// Filename written to disk, e.g. `libpdfium.dylib`.
    pub lib_name: &'static str,
}

/// Detect the release asset for the running OS/architecture.
pub fn platform() -> Result<Platform, PdfiumSourceError> {
    platform_for(std::env::consts::OS, std::env::consts::ARCH)
}

fn platform_for(os: &str, arch: &str) -> Result<Platform, PdfiumSourceError> {
    let (archive_name, lib_path_in_archive, lib_name) = match (os, arch) {
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so"),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so"),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll"),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll"),
        ("windows", "x86") => ("pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll"),
        (os, arch) => {
            return Err(PdfiumSourceError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };

    Ok(Platform {
        archive_name,
        lib_path_in_archive,
        lib_name,
    })
}

// ── Local resolution ─────────────────────────────────────────────────────────

/// Per-version cache directory for the PDFium library.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/pdf2img/pdfium-{version}/`
/// - **Linux**: `~/.cache/pdf2img/pdfium-{version}/`
/// - **Windows**: `%LOCALAPPDATA%\pdf2img\pdfium-{version}\`
///
/// Override the base by setting `PDFIUM_CACHE_DIR`.
pub fn cache_dir(version: &str) -> PathBuf {
    if let Ok(override_dir) = std::env::var("PDFIUM_CACHE_DIR") {
        return PathBuf::from(override_dir).join(format!("pdfium-{version}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pdf2img").join(format!("pdfium-{version}"))
}

/// Where a release download for `version` lands on disk.
pub fn cached_library_path(version: &str) -> Result<PathBuf, PdfiumSourceError> {
    let info = platform()?;
    Ok(cache_dir(version).join(info.lib_name))
}

/// The preferred local library location.
///
/// `PDFIUM_LIB_PATH` wins when set (whether or not the file exists; callers
/// decide what a missing file means). Otherwise the cache path for
/// [`PDFIUM_VERSION`].
pub fn local_library_path() -> Result<PathBuf, PdfiumSourceError> {
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        if !p.is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    cached_library_path(PDFIUM_VERSION)
}

// ── Release resolution ───────────────────────────────────────────────────────

/// Release URL for this platform, with the tag left as [`VERSION_PLACEHOLDER`].
pub fn release_url_template() -> Result<String, PdfiumSourceError> {
    let info = platform()?;
    Ok(format!(
        "{BASE_URL}/chromium%2F{VERSION_PLACEHOLDER}/{}",
        info.archive_name
    ))
}

/// Substitute every `{version}` in `template`.
pub fn expand_template(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

/// Serialises downloads so concurrent renders never write the same file twice.
static FETCH_LOCK: Mutex<()> = Mutex::new(());

/// Download the archive at `url` and extract the library to `dest`.
///
/// Returns immediately when `dest` already exists. Blocking; call it from
/// `spawn_blocking` or another non-async context.
pub fn fetch_library(url: &str, dest: &Path) -> Result<PathBuf, PdfiumSourceError> {
    let _guard = FETCH_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    if dest.exists() {
        debug!("PDFium already cached at {}", dest.display());
        return Ok(dest.to_path_buf());
    }

    let info = platform()?;
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(PdfiumSourceError::CacheDir)?;
    }

    info!("Fetching PDFium from {url}");
    let archive_bytes = download_bytes(url)?;
    extract_library(&archive_bytes, info.lib_path_in_archive, dest)?;
    info!("PDFium extracted to {}", dest.display());

    Ok(dest.to_path_buf())
}

/// Bind a PDFium library at an explicit `path`.
pub fn bind(path: &Path) -> Result<Pdfium, PdfiumSourceError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumSourceError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Read a URL fully into memory in 64 KiB chunks.
fn download_bytes(url: &str) -> Result<Vec<u8>, PdfiumSourceError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-source/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumSourceError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumSourceError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumSourceError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let capacity = total.unwrap_or(35 * 1024 * 1024) as usize;
    let mut buf = Vec::with_capacity(capacity);

    let mut stream = response;
    let mut chunk = vec![0u8; 64 * 1024];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(PdfiumSourceError::Download(format!("Read error: {e}")));
            }
        }
    }

    debug!("Downloaded {} bytes (expected {:?})", buf.len(), total);
    Ok(buf)
}

/// Extract a single file from a gzipped tar archive into `dest_path`.
fn extract_library(
    archive_bytes: &[u8],
    lib_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PdfiumSourceError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let gz = GzDecoder::new(archive_bytes);
    let mut archive = Archive::new(gz);

    for entry in archive
        .entries()
        .map_err(|e| PdfiumSourceError::Extract(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| PdfiumSourceError::Extract(e.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|e| PdfiumSourceError::Extract(e.to_string()))?;

        if entry_path.to_string_lossy() == lib_path_in_archive {
            // Unpack next to the destination, then rename, so a crash never
            // leaves a truncated library behind.
            let partial = dest_path.with_extension("partial");
            entry
                .unpack(&partial)
                .map_err(|e| PdfiumSourceError::Extract(format!("Unpack failed: {e}")))?;
            std::fs::rename(&partial, dest_path)
                .map_err(|e| PdfiumSourceError::Extract(format!("Rename failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PdfiumSourceError::Extract(format!(
        "Library '{lib_path_in_archive}' not found in archive"
    )))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_platform_is_supported() {
        platform().expect("current platform should be supported");
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = platform_for("plan9", "mips").unwrap_err();
        assert!(err.to_string().contains("plan9/mips"), "got: {err}");
    }

    #[test]
    fn windows_library_lives_in_bin() {
        let info = platform_for("windows", "x86_64").unwrap();
        assert_eq!(info.lib_path_in_archive, "bin/pdfium.dll");
        assert_eq!(info.lib_name, "pdfium.dll");
    }

    #[test]
    fn cache_dir_embeds_version() {
        let d = cache_dir("1234");
        assert!(d.to_str().unwrap().ends_with("pdfium-1234"));
        assert_eq!(d, cache_dir("1234"));
    }

    #[test]
    fn template_keeps_placeholder_until_expanded() {
        let template = release_url_template().unwrap();
        assert!(template.contains(VERSION_PLACEHOLDER));

        let url = expand_template(&template, PDFIUM_VERSION);
        assert!(!url.contains(VERSION_PLACEHOLDER));
        assert!(url.contains(&format!("chromium%2F{PDFIUM_VERSION}")));
        assert!(url.starts_with(BASE_URL));
    }

    #[test]
    fn fetch_is_a_no_op_when_already_cached() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libpdfium.so");
        std::fs::write(&dest, b"stub").unwrap();

        // The URL is never contacted because the file is already there.
        let got = fetch_library("http://invalid.invalid/pdfium.tgz", &dest).unwrap();
        assert_eq!(got, dest);
    }

    #[test]
    fn extract_reports_missing_entry() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        let data = b"not the library";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, "README.txt", &data[..])
            .unwrap();
        let archive = builder.into_inner().unwrap().finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = extract_library(&archive, "lib/libpdfium.so", &dir.path().join("x.so"))
            .unwrap_err();
        assert!(err.to_string().contains("not found in archive"), "got: {err}");
    }
}
