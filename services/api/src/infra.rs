use hcc_raf::config::ReferenceConfig;
use hcc_raf::reference::{ReferenceLoadError, ReferenceLoader, ReferenceSnapshot};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) reference: Arc<SharedReference>,
    pub(crate) settings: Arc<ReferenceConfig>,
}

/// Current reference snapshot. Readers clone the `Arc` and release the lock
/// immediately, so a reload never blocks an in-flight calculation.
#[derive(Debug)]
pub(crate) struct SharedReference {
    current: RwLock<Arc<ReferenceSnapshot>>,
}

impl SharedReference {
    pub(crate) fn new(snapshot: ReferenceSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub(crate) fn current(&self) -> Arc<ReferenceSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub(crate) fn replace(&self, snapshot: ReferenceSnapshot) -> Arc<ReferenceSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&snapshot);
        snapshot
    }
}

impl Default for SharedReference {
    fn default() -> Self {
        Self::new(ReferenceSnapshot::builder().build())
    }
}

pub(crate) fn reference_loader(settings: &ReferenceConfig) -> ReferenceLoader {
    let loader = ReferenceLoader::new(settings.data_dir.clone());
    match &settings.dx_to_cc_file {
        Some(file) => loader.with_dx_to_cc_file(file.clone()),
        None => loader,
    }
}

/// Reads the configured directory and swaps the result in. The previous
/// snapshot stays active if loading fails.
pub(crate) fn reload_reference(
    settings: &ReferenceConfig,
    shared: &SharedReference,
) -> Result<Arc<ReferenceSnapshot>, ReferenceLoadError> {
    let snapshot = reference_loader(settings).load()?;
    let models = snapshot.models().len();
    let snapshot = shared.replace(snapshot);
    info!(
        data_dir = %settings.data_dir.display(),
        models,
        "reference snapshot swapped in"
    );
    Ok(snapshot)
}
