//! Network module with deferred startup lifecycle.
//!
//! `new()` wires shared state, `start()` binds the listener and `serve()`
//! accepts connections. Between `start()` and `serve()` the caller can
//! spawn background work (nonce rotation) that depends on the bound server.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{any, get};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    health_handler, liveness_handler, readiness_handler, xacml_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::service::Dispatcher;

/// Owns the listener and the router for the gateway.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    dispatcher: Arc<Dispatcher>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            listener: None,
            dispatcher,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Routes:
    /// - `ANY /xacml`, `ANY /xacml/{*path}` -- XACML REST endpoint
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    pub fn build_router(&self) -> Router {
        router(
            &self.config,
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.shutdown),
        )
    }

    /// Binds the listener and returns the bound port (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        let port = listener.local_addr()?.port();
        info!(host = %self.config.host, port, "TCP listener bound");
        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called, if TLS material cannot
    /// be loaded, or on a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let Self {
            config,
            listener,
            shutdown: shutdown_ctrl,
            ..
        } = self;
        let listener =
            listener.ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;

        shutdown_ctrl.set_ready();

        if let Some(tls) = &config.tls {
            serve_tls(listener, router, tls, shutdown).await?;
        } else {
            info!("serving plain HTTP");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await?;
        }

        drain(&shutdown_ctrl, config.drain_timeout).await;
        Ok(())
    }
}

fn router(
    config: &NetworkConfig,
    dispatcher: Arc<Dispatcher>,
    shutdown: Arc<ShutdownController>,
) -> Router {
    let state = AppState {
        dispatcher,
        shutdown,
        start_time: Instant::now(),
    };

    Router::new()
        .route("/xacml", any(xacml_handler))
        .route("/xacml/{*path}", any(xacml_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .layer(build_http_layers(config))
        .with_state(state)
}

/// Serves HTTPS through `axum-server`, reusing the pre-bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "serving HTTPS");
    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

async fn drain(shutdown_ctrl: &ShutdownController, timeout: Duration) {
    shutdown_ctrl.trigger_shutdown();
    let pending = shutdown_ctrl.in_flight_count();
    if pending > 0 {
        info!(pending, "draining in-flight requests");
    }
    if shutdown_ctrl.wait_for_drain(timeout).await {
        info!("all requests drained");
    } else {
        warn!(
            remaining = shutdown_ctrl.in_flight_count(),
            "drain timeout expired"
        );
    }
}
