//! Shared bb8 pool of async PostgreSQL connections.
//!
//! Repositories clone [`DbPool`] and check out one connection per port
//! call. A failed checkout becomes the `Connection` variant of the calling
//! port's error.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

const MAX_CONNECTIONS: u32 = 10;
const MIN_IDLE: u32 = 2;
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pool construction or checkout failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("database pool checkout failed: {0}")]
    Checkout(String),
    #[error("database pool could not be built: {0}")]
    Build(String),
}

impl PoolError {
    /// Checkout failure carrying the driver message.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout(message.into())
    }

    /// Driver text without the phase prefix.
    pub fn into_message(self) -> String {
        match self {
            Self::Checkout(message) | Self::Build(message) => message,
        }
    }
}

/// Where to connect and how many idle connections to keep warm.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    url: String,
    min_idle: Option<u32>,
}

impl PoolConfig {
    /// Defaults for `url`: two warm connections.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            min_idle: Some(MIN_IDLE),
        }
    }

    /// `None` defers every connection until first checkout.
    #[must_use]
    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }
}

/// Connection pool handed to every Diesel repository.
#[derive(Clone)]
pub struct DbPool(Pool<AsyncPgConnection>);

impl DbPool {
    /// Build the pool with up to ten connections and a 30 second checkout
    /// timeout.
    ///
    /// # Errors
    /// [`PoolError::Build`] when the warm connections cannot be opened.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url);
        Pool::builder()
            .max_size(MAX_CONNECTIONS)
            .min_idle(config.min_idle)
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)
            .await
            .map(Self)
            .map_err(|err| PoolError::Build(err.to_string()))
    }

    /// # Errors
    /// [`PoolError::Checkout`] on timeout or a refused connection.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.0
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}
