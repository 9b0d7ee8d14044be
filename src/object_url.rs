//! Ephemeral URLs that alias encoded image bytes.
//!
//! A converted image is exposed twice: as an owned [`crate::output::ImageFile`]
//! and as an object URL (`blob:pdf2img/<uuid>`) that a preview or an HTTP
//! handler can resolve back to the bytes. Both point at the same `Arc<[u8]>`;
//! registering a URL copies nothing.
//!
//! URLs are **not** released automatically. Whoever receives one owns it and
//! must call [`ObjectUrlRegistry::revoke`] (or [`revoke_object_url`]) once it
//! is no longer displayed, otherwise the bytes stay alive in the registry for
//! the rest of the process.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Prefix shared by every URL this crate hands out.
pub const OBJECT_URL_PREFIX: &str = "blob:pdf2img/";

/// Maps object URLs to the bytes they alias.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: Mutex<HashMap<String, Arc<[u8]>>>,
}

static GLOBAL: Lazy<Arc<ObjectUrlRegistry>> = Lazy::new(|| Arc::new(ObjectUrlRegistry::new()));

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`crate::convert::Converter`] by default.
    pub fn global() -> Arc<ObjectUrlRegistry> {
        Arc::clone(&GLOBAL)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `bytes` under a fresh URL.
    pub fn create(&self, bytes: Arc<[u8]>) -> String {
        let url = format!("{OBJECT_URL_PREFIX}{}", Uuid::new_v4());
        debug!("Created object URL {} ({} bytes)", url, bytes.len());
        self.entries().insert(url.clone(), bytes);
        url
    }

    /// The bytes behind `url`, if it is still registered.
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.entries().get(url).cloned()
    }

    /// Release `url`. Returns `false` if it was unknown or already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.entries().remove(url).is_some();
        if removed {
            debug!("Revoked object URL {}", url);
        }
        removed
    }

    /// Number of URLs currently registered.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Register `bytes` in the global registry.
pub fn create_object_url(bytes: Arc<[u8]>) -> String {
    GLOBAL.create(bytes)
}

/// Release `url` from the global registry.
pub fn revoke_object_url(url: &str) -> bool {
    GLOBAL.revoke(url)
}
