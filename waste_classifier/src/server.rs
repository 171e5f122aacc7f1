use crate::{
    classifier::Classifier, config::Config, routes::api_routes, telemetry::Metrics, view::Views,
};
use axum::{extract::DefaultBodyLimit, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::{future::Future, sync::Arc};
use tokio::net::TcpListener;

/// Outcome of loading the classifier at startup. A failed load keeps the
/// server up so the error can be shown instead of the upload form.
#[derive(Clone)]
pub enum ModelStatus {
    Ready(Arc<Classifier>),
    Unavailable(Arc<str>),
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready(_))
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub model: ModelStatus,
    pub views: Arc<Views>,
    pub metrics: Arc<Metrics>,
}

pub fn build_router(state: SharedState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(api_routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(state: SharedState, config: &Config) -> anyhow::Result<Self> {
        let addr = config.server.get_address();
        let metrics_layer = HttpMetricsLayerBuilder::new().build();

        let router = build_router(state, config.upload.max_bytes).layer(metrics_layer);
        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
