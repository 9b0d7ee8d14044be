//! Output types: the conversion result and the image file it carries.

use crate::error::Pdf2ImgError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::path::Path;
use std::sync::Arc;

/// Error text reported when the encoder produces no data.
pub const BLOB_ERROR: &str = "Failed to create image blob";

static PDF_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").expect("valid regex"));

/// Output file name for an input called `input_name`.
///
/// A trailing `.pdf` is stripped regardless of case, then `.png` appended:
/// `report.PDF` → `report.png`, `notes` → `notes.png`.
pub fn output_file_name(input_name: &str) -> String {
    format!("{}.png", PDF_SUFFIX.replace(input_name, ""))
}

/// An encoded image owned by the caller.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The shared buffer itself, for aliasing it elsewhere.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A self-contained `data:` URI. Needs no release, unlike object URLs.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.bytes))
    }

    /// Write the image to `path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), Pdf2ImgError> {
        let path = path.as_ref();
        let write_err = |source| Pdf2ImgError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("png.tmp");
        tokio::fs::write(&tmp_path, &self.bytes)
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        Ok(())
    }
}

impl Serialize for ImageFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ImageFile", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("media_type", &self.media_type)?;
        s.serialize_field("size", &self.bytes.len())?;
        s.end()
    }
}

/// Outcome of one conversion.
///
/// Exactly one shape is ever produced: success carries a non-empty
/// `image_url` and a `file`, with no `error`; failure carries an `error`, an
/// empty `image_url` and no `file`.
///
/// On success the caller owns `image_url` and must revoke it
/// ([`crate::object_url::revoke_object_url`]) when done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub image_url: String,
    pub file: Option<ImageFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn success(image_url: String, file: ImageFile) -> Self {
        Self {
            image_url,
            file: Some(file),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            image_url: String::new(),
            file: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.image_url.is_empty() && self.file.is_some()
    }
}
