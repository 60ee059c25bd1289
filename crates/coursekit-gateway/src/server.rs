use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use coursekit_llm::LlmProvider;
use coursekit_tutor::TutorService;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::router::build_router;

/// Shared by every handler. `P` need not be `Clone`, so the impl is manual.
pub(crate) struct AppState<P> {
    pub tutor: Arc<TutorService<P>>,
    pub started_at: Instant,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            tutor: Arc::clone(&self.tutor),
            started_at: self.started_at,
        }
    }
}

pub struct GatewayServer<P> {
    config: GatewayConfig,
    addr: SocketAddr,
    tutor: Arc<TutorService<P>>,
    shutdown: watch::Receiver<bool>,
}

impl<P: LlmProvider + 'static> GatewayServer<P> {
    #[must_use]
    pub fn new(
        config: &GatewayConfig,
        tutor: Arc<TutorService<P>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            addr: config.socket_addr(),
            config: config.clone(),
            tutor,
            shutdown,
        }
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves the tutor endpoints until the shutdown channel reads `true`
    /// or its sender is dropped.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Bind`] when the address is taken, [`GatewayError::Serve`]
    /// when the accept loop fails.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let Self {
            config,
            addr,
            tutor,
            mut shutdown,
        } = self;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        let local = listener.local_addr().unwrap_or(addr);
        tracing::info!(%local, "tutor gateway listening");

        let state = AppState {
            tutor,
            started_at: Instant::now(),
        };
        let app = build_router(state, config.rate_limit, config.max_body_size)
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // A dropped sender also counts as a stop request.
                let _ = shutdown.wait_for(|stop| *stop).await;
                tracing::info!("tutor gateway draining connections");
            })
            .await
            .map_err(GatewayError::Serve)
    }
}
