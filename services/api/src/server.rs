use crate::cli::ServeArgs;
use crate::infra::{reload_reference, AppState, SharedReference};
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use hcc_raf::config::AppConfig;
use hcc_raf::error::AppError;
use hcc_raf::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        reference: Arc::new(SharedReference::default()),
        settings: Arc::new(config.reference.clone()),
    };

    let app = router(app_state.clone()).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve health and metrics while the reference tables load; /ready
    // flips once the first snapshot is in place.
    let settings = Arc::clone(&app_state.settings);
    let shared = Arc::clone(&app_state.reference);
    tokio::task::spawn_blocking(move || match reload_reference(&settings, &shared) {
        Ok(_) => readiness_flag.store(true, Ordering::Release),
        Err(err) => error!(error = %err, "initial reference load failed"),
    });

    info!(
        ?config.environment,
        %addr,
        default_model = %config.reference.default_model,
        "risk adjustment service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
