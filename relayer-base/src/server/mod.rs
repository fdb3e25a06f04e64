use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use derive_new::new;
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{error, info_span, Instrument};

use crate::RelayerMetrics;

/// A server that serves relayer routes next to `/metrics`
#[derive(new, Debug)]
pub struct Server {
    listen_port: u16,
    metrics: Arc<RelayerMetrics>,
}

impl Server {
    /// Run an HTTP server serving `router` on `0.0.0.0:<listen_port>`
    ///
    /// routes:
    ///  - metrics - serving OpenMetrics format reports on `/metrics`
    ///  - custom_routes - additional routes, e.g. the relayer API
    pub fn run_with_custom_router(self: Arc<Self>, router: Router) -> JoinHandle<()> {
        let port = self.listen_port;
        tracing::info!(port, "starting server on 0.0.0.0");

        tokio::spawn(
            async move {
                let url = format!("0.0.0.0:{}", port);
                match TcpListener::bind(url).await {
                    Ok(listener) => self.serve(listener, router).await,
                    Err(err) => error!(?err, port, "Failed to bind to TCP port"),
                }
            }
            .instrument(info_span!("server")),
        )
    }

    /// Serve on an already bound listener
    pub async fn serve(self: Arc<Self>, listener: TcpListener, router: Router) {
        let metrics = self.metrics.clone();
        let app = Router::new()
            .route("/metrics", get(move || Self::gather_metrics(metrics)))
            .merge(router);
        if let Err(err) = axum::serve(listener, app).await {
            error!(?err, "Server stopped");
        }
    }

    /// Gather available metrics into an encoded (plaintext, OpenMetrics format)
    /// report.
    async fn gather_metrics(metrics: Arc<RelayerMetrics>) -> impl IntoResponse {
        tracing::debug!("Traversing route for /metrics endpoint for serving Prometheus metrics");
        match metrics.gather().map(String::from_utf8) {
            Ok(Ok(metrics)) => (StatusCode::OK, metrics),
            Ok(Err(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".into(),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to gather metrics".into(),
            ),
        }
    }
}
