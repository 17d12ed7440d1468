use metrics_exporter_prometheus::PrometheusHandle;
use roster::catalog::{CatalogReconciler, MediaDiscovery, PgCatalogSource, StaticCatalog};
use roster::config::AppConfig;
use roster::error::AppError;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn media_discovery(config: &AppConfig) -> MediaDiscovery {
    MediaDiscovery::new(
        config.catalog.media_root.clone(),
        config.catalog.media_url_prefix.clone(),
    )
}

/// Loads the snapshot and wires the Postgres source. An unreadable or
/// corrupt snapshot is fatal.
pub(crate) fn load_reconciler(config: &AppConfig) -> Result<CatalogReconciler<PgCatalogSource>, AppError> {
    let snapshot = StaticCatalog::from_path(&config.catalog.snapshot_path)?;
    let source = PgCatalogSource::new(config.database.clone());

    info!(
        snapshot = %config.catalog.snapshot_path.display(),
        models = snapshot.len(),
        store_configured = source.is_configured(),
        "catalog sources loaded"
    );

    Ok(CatalogReconciler::new(
        Arc::new(source),
        Arc::new(snapshot),
        media_discovery(config),
    ))
}
