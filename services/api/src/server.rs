use crate::cli::ServeArgs;
use crate::infra::{snapshot_path, AppState, Engine, EngineHandle};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lead_engagement::config::AppConfig;
use lead_engagement::error::AppError;
use lead_engagement::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
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

    let snapshot = snapshot_path(args.snapshot.take(), &config.engine);
    let engine = EngineHandle::load(snapshot.as_deref(), None, &config.engine)?;

    if let Some(period) = config.engine.recompute_interval {
        tokio::spawn(run_scheduled_recompute(engine.service.clone(), period));
        info!(period_secs = period.as_secs(), "scheduled recompute enabled");
    }

    let app = with_service_routes(engine.service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead engagement engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs the batch recompute on a fixed period. The first tick fires one period after startup.
async fn run_scheduled_recompute(service: Arc<Engine>, period: Duration) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Err(err) = service.recompute_all().await {
            warn!(error = %err, "scheduled recompute failed");
        }
    }
}
