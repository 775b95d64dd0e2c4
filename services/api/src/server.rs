use crate::cli::ServeArgs;
use crate::frontend::FrontendAssets;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum_prometheus::PrometheusMetricLayer;
use maizebus::config::AppConfig;
use maizebus::error::AppError;
use maizebus::forms::FormRelayService;
use maizebus::mail::MailDispatcher;
use maizebus::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
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

    let dispatcher = MailDispatcher::from_config(&config.mail)?;
    let mail_state = dispatcher.label();
    let form_service = Arc::new(FormRelayService::new(dispatcher, &config.uploads));

    let frontend = FrontendAssets::new(&config.frontend);
    if !frontend.is_built() {
        warn!(
            dist = %frontend.dist_dir().display(),
            "client bundle not found; non-API routes will answer 404"
        );
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        frontend: Arc::new(frontend),
    };

    let app = with_service_routes(form_service, &config.cors, app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        environment = ?config.environment,
        %addr,
        mail = mail_state,
        uploads = %config.uploads.dir.display(),
        "MaizeBus backend ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness_flag))
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal(readiness: Arc<AtomicBool>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    readiness.store(false, Ordering::Release);
}
