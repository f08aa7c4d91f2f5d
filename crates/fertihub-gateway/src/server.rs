use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use fertihub_llm::{ProviderKind, ProviderSet};
use fertihub_storage::ObjectStore;
use fertihub_store::SqliteStore;
use tokio::sync::watch;

use crate::error::GatewayError;
use crate::router::{RouterConfig, build_router};

/// Consultation defaults applied when a request does not pick a provider.
#[derive(Debug, Clone, Copy)]
pub struct AiSettings {
    pub default_provider: ProviderKind,
    pub fallback_enabled: bool,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::Groq,
            fallback_enabled: true,
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub store: SqliteStore,
    pub providers: ProviderSet,
    pub object_store: Option<Arc<ObjectStore>>,
    pub ai: AiSettings,
    pub started_at: Instant,
}

pub struct GatewayServer {
    addr: SocketAddr,
    config: RouterConfig,
    store: SqliteStore,
    providers: ProviderSet,
    object_store: Option<ObjectStore>,
    ai: AiSettings,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        store: SqliteStore,
        providers: ProviderSet,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        Self {
            addr,
            config: RouterConfig::default(),
            store,
            providers,
            object_store: None,
            ai: AiSettings::default(),
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, token: Option<String>) -> Self {
        self.config.auth_token = token;
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, limit: u32) -> Self {
        self.config.rate_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    #[must_use]
    pub fn with_max_upload_size(mut self, size: usize) -> Self {
        self.config.max_upload_size = size;
        self
    }

    /// Enable the `/api/r2` routes. Without a store they answer 503.
    #[must_use]
    pub fn with_object_store(mut self, store: Option<ObjectStore>) -> Self {
        self.object_store = store;
        self
    }

    #[must_use]
    pub fn with_ai(mut self, ai: AiSettings) -> Self {
        self.ai = ai;
        self
    }

    /// Start the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState {
            store: self.store,
            providers: self.providers,
            object_store: self.object_store.map(Arc::new),
            ai: self.ai,
            started_at: Instant::now(),
        };

        let router = build_router(state, self.config);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow_and_update() {
                if shutdown_rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            tracing::info!("gateway shutting down");
        })
        .await
        .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}
