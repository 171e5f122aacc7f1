use crate::config::Config;
use crate::loader::load_classifier;
use crate::server::{HttpServer, ModelStatus, SharedState};
use crate::telemetry::Metrics;
use crate::view::Views;

use std::{error::Error, sync::Arc};
use tokio::signal;

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let model = match load_classifier(&config.model) {
        Ok(classifier) => ModelStatus::Ready(Arc::new(classifier)),
        Err(e) => {
            tracing::error!("Failed to load classifier: {}", e);
            ModelStatus::Unavailable(Arc::from(e.to_string()))
        }
    };

    let views = Arc::new(Views::new()?);
    let metrics = Arc::new(Metrics::new()?);

    let state = SharedState {
        model,
        views,
        metrics,
    };

    let server = HttpServer::new(state, &config).await?;
    server.run(shutdown_signal()).await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
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

    tracing::info!("Shutdown signal received, starting graceful shutdown.");
}
