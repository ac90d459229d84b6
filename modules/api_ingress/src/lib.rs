//! HTTP host: wraps module routers with the shared middleware stack, the
//! `/health` check and the JSON 404 fallback, then serves them until cancelled.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

/// Owns the HTTP-facing concerns shared by every module router.
#[derive(Debug, Clone, Default)]
pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl ApiIngress {
    pub const MODULE_NAME: &'static str = "api_ingress";

    pub fn new(config: ApiIngressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Build the final application router around `routes`.
    ///
    /// Layer order (outermost first):
    /// SetRequestId -> Trace -> PropagateRequestId -> push_req_id_to_extensions
    /// -> envelope_layer_rejections -> Timeout -> CORS -> BodyLimit
    pub fn build_router(&self, routes: Router) -> Router {
        tracing::debug!("Building application router");

        let mut router = Router::new()
            .merge(routes)
            .route("/health", get(web::health_check))
            // Must come after all routes: it is applied to the method routers registered so far.
            .method_not_allowed_fallback(web::route_not_found)
            .fallback(web::route_not_found);

        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            self.config.request_timeout_sec,
        )));

        router = router.layer(from_fn(web::envelope_layer_rejections));

        let x_request_id = request_id::header();
        router
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(request_id::create_trace_layer())
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    /// Bind `addr` and serve `router` until `cancel` fires.
    ///
    /// After cancellation in-flight requests are drained; a non-zero
    /// `drain_timeout` bounds how long that may take.
    pub async fn serve(
        &self,
        router: Router,
        addr: SocketAddr,
        cancel: CancellationToken,
        drain_timeout: Option<Duration>,
    ) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = {
            let cancel = cancel.clone();
            async move {
                cancel.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully");
            }
        };

        let server = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .into_future();

        match drain_timeout {
            None => server.await.context("HTTP server failed"),
            Some(limit) => {
                let deadline = async move {
                    cancel.cancelled().await;
                    tokio::time::sleep(limit).await;
                };
                tokio::select! {
                    res = server => res.context("HTTP server failed"),
                    _ = deadline => {
                        tracing::warn!(?limit, "Graceful shutdown deadline reached, dropping open connections");
                        Ok(())
                    }
                }
            }
        }
    }
}
