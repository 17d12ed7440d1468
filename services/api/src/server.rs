use crate::cli::ServeArgs;
use crate::infra::{load_reconciler, AppState};
use crate::routes::with_site_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use roster::applications::{ApplicationService, SmtpRelay};
use roster::config::AppConfig;
use roster::error::AppError;
use roster::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let reconciler = Arc::new(load_reconciler(&config)?);
    if config.mail.is_none() {
        warn!("SMTP is not configured; application submissions will be rejected");
    }
    let applications = Arc::new(ApplicationService::new(
        Arc::new(SmtpRelay),
        config.mail.clone(),
    ));

    let app = with_site_routes(reconciler, applications)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "model catalog service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
