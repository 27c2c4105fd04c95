//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use musiconthego::domain::ports::{MediaStore, UnconfiguredMediaStore};
use musiconthego::domain::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TOKEN_TTL_HOURS};
use musiconthego::inbound::ws::origin::OriginPolicy;
use musiconthego::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) token_ttl_hours: u32,
    pub(crate) max_upload_bytes: usize,
    pub(crate) origins: OriginPolicy,
    pub(crate) media_store: Arc<dyn MediaStore>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Configuration with default token lifetime, upload ceiling, and no
    /// media host.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        Self {
            bind_addr,
            db_pool,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            origins: OriginPolicy::default(),
            media_store: Arc::new(UnconfiguredMediaStore),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    #[must_use]
    pub fn with_token_ttl_hours(mut self, hours: u32) -> Self {
        self.token_ttl_hours = hours;
        self
    }

    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Restrict WebSocket upgrades to the given origins.
    #[must_use]
    pub fn with_origins(mut self, origins: OriginPolicy) -> Self {
        self.origins = origins;
        self
    }

    /// Replace the media host used for uploads.
    #[must_use]
    pub fn with_media_store(mut self, store: Arc<dyn MediaStore>) -> Self {
        self.media_store = store;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
