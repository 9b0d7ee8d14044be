//! Lazy, single-flight loading of the rendering library.
//!
//! The first call to [`LibraryLoader::ensure_loaded`] imports the library and
//! assigns its worker source. Every caller that arrives while that import is
//! still running awaits the *same* import; nobody starts a second one. Once it
//! resolves, the handle is cached for the life of the loader, which for
//! [`LibraryLoader::global`] is the life of the process.
//!
//! Worker configuration tries the local location first and falls back to a
//! remote URL versioned after the loaded library. The fallback is reported as
//! [`WorkerSetup::Fallback`] and logged; the caller of `ensure_loaded` never
//! sees it. Import failures are *not* handled here: they propagate so the
//! converter can turn them into a failure result.

use crate::backend::pdfium::PdfiumImporter;
use crate::config::LoaderConfig;
use crate::error::Pdf2ImgError;
use crate::library::{PdfLibrary, WorkerSource};
use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};
use once_cell::sync::Lazy;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Asynchronously acquires a rendering library.
///
/// Any `Fn() -> impl Future<Output = Result<Arc<dyn PdfLibrary>, _>>` closure
/// is an importer, which keeps test doubles short.
pub trait LibraryImporter: Send + Sync {
    fn import(&self) -> BoxFuture<'static, Result<Arc<dyn PdfLibrary>, Pdf2ImgError>>;
}

impl<F, Fut> LibraryImporter for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<dyn PdfLibrary>, Pdf2ImgError>> + Send + 'static,
{
    fn import(&self) -> BoxFuture<'static, Result<Arc<dyn PdfLibrary>, Pdf2ImgError>> {
        Box::pin(self())
    }
}

/// Which branch of worker configuration was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerSetup {
    /// The local worker was accepted.
    Local(WorkerSource),
    /// The local worker was rejected with `cause`; `source` is the remote one.
    Fallback { source: WorkerSource, cause: String },
}

impl WorkerSetup {
    /// The worker source that ended up assigned.
    pub fn source(&self) -> &WorkerSource {
        match self {
            WorkerSetup::Local(s) => s,
            WorkerSetup::Fallback { source, .. } => source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, WorkerSetup::Fallback { .. })
    }
}

/// Assign `library`'s worker: local first, versioned remote URL otherwise.
///
/// Only a failure of the remote assignment is returned as `Err`.
pub fn configure_worker(
    library: &dyn PdfLibrary,
    config: &LoaderConfig,
) -> Result<WorkerSetup, Pdf2ImgError> {
    let local = WorkerSource::Local(config.local_worker_src.clone());
    match library.set_worker_source(local.clone()) {
        Ok(()) => {
            info!("PDF worker configured with local file {}", local);
            Ok(WorkerSetup::Local(local))
        }
        Err(e) => {
            warn!("Failed to set local worker, using remote fallback: {}", e);
            let remote = WorkerSource::Remote(config.fallback_url(library.version()));
            library.set_worker_source(remote.clone())?;
            Ok(WorkerSetup::Fallback {
                source: remote,
                cause: e.to_string(),
            })
        }
    }
}

/// An import plus worker setup that any number of callers can await.
type SharedLoad = Shared<BoxFuture<'static, Result<Arc<dyn PdfLibrary>, Arc<Pdf2ImgError>>>>;

enum LoadState {
    Idle,
    Loading(SharedLoad),
    Ready(Arc<dyn PdfLibrary>),
}

/// Loads a rendering library at most once and hands out the shared handle.
pub struct LibraryLoader {
    importer: Box<dyn LibraryImporter>,
    config: LoaderConfig,
    state: Mutex<LoadState>,
}

static GLOBAL: Lazy<Arc<LibraryLoader>> = Lazy::new(|| {
    Arc::new(LibraryLoader::new(
        PdfiumImporter,
        LoaderConfig::pdfium_default(),
    ))
});

impl LibraryLoader {
    pub fn new(importer: impl LibraryImporter + 'static, config: LoaderConfig) -> Self {
        Self {
            importer: Box::new(importer),
            config,
            state: Mutex::new(LoadState::Idle),
        }
    }

    /// The process-wide PDFium loader.
    pub fn global() -> Arc<LibraryLoader> {
        Arc::clone(&GLOBAL)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// `true` once a library has been imported and configured.
    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock_state(), LoadState::Ready(_))
    }

    /// Return the library, importing it on first use.
    ///
    /// Every caller that arrives while an import is pending awaits that same
    /// import and sees its outcome, success or failure. Once a failed import
    /// has resolved nothing stays cached, so a later call starts a fresh one.
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn PdfLibrary>, Pdf2ImgError> {
        let load = {
            let mut state = self.lock_state();
            match &*state {
                LoadState::Ready(library) => return Ok(Arc::clone(library)),
                LoadState::Loading(load) => load.clone(),
                LoadState::Idle => {
                    let load = self.start_load();
                    *state = LoadState::Loading(load.clone());
                    load
                }
            }
        };

        let outcome = load.clone().await;

        {
            let mut state = self.lock_state();
            if matches!(&*state, LoadState::Loading(current) if current.ptr_eq(&load)) {
                *state = match &outcome {
                    Ok(library) => LoadState::Ready(Arc::clone(library)),
                    Err(_) => LoadState::Idle,
                };
            }
        }
        drop(load);

        // The last waiter to let go gets the error back by value.
        outcome.map_err(|e| Arc::try_unwrap(e).unwrap_or_else(Pdf2ImgError::SharedLoad))
    }

    fn start_load(&self) -> SharedLoad {
        let import = self.importer.import();
        let config = self.config.clone();
        async move {
            debug!("Importing PDF rendering library");
            let library = import.await?;
            let setup = configure_worker(library.as_ref(), &config)?;
            info!(
                "PDF rendering library {} ready (worker: {}{})",
                library.version(),
                setup.source(),
                if setup.is_fallback() { ", fallback" } else { "" }
            );
            Ok::<_, Pdf2ImgError>(library)
        }
        .map_err(Arc::new)
        .boxed()
        .shared()
    }

    fn lock_state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for LibraryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryLoader")
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
