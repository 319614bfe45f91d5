//! Lazily established, memoized database connection.
//!
//! The first caller of [`ConnectionCache::get`] starts the single
//! establishment attempt on its own task; every caller, including ones
//! arriving while it is in flight, awaits that same attempt. Dropping a
//! caller never abandons the attempt. The outcome is stored once and never
//! replaced: a successful handle is shared for the rest of the process
//! lifetime, a failure is terminal and reported to the process entry point,
//! which shuts down.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::config::DatabaseConfig;
use crate::errors::ConnectionError;

/// Opens a session with the document store.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Reusable handle; clones refer to the same underlying session.
    type Handle: Clone + Send + Sync + 'static;

    async fn connect(&self, config: &DatabaseConfig) -> Result<Self::Handle, ConnectionError>;
}

/// Lifecycle of the cached connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Connected,
    Failed,
}

type Outcome<H> = Result<H, ConnectionError>;
type Attempt<H> = Shared<BoxFuture<'static, Outcome<H>>>;

/// State owned by the establishment task.
struct Establisher<C: Connector> {
    connector: C,
    config: DatabaseConfig,
    outcome: OnceLock<Outcome<C::Handle>>,
    fatal_tx: Option<mpsc::UnboundedSender<ConnectionError>>,
}

/// Process-wide holder of the single connection handle.
pub struct ConnectionCache<C: Connector> {
    inner: Arc<Establisher<C>>,
    attempt: OnceLock<Attempt<C::Handle>>,
}

impl<C: Connector> ConnectionCache<C> {
    /// Creates an uninitialized cache. No I/O happens until [`get`](Self::get).
    pub fn new(connector: C, config: DatabaseConfig) -> Self {
        Self {
            inner: Arc::new(Establisher {
                connector,
                config,
                outcome: OnceLock::new(),
                fatal_tx: None,
            }),
            attempt: OnceLock::new(),
        }
    }

    /// Registers the channel that receives the fatal error if establishment fails.
    ///
    /// Must be called before the cache is shared.
    pub fn with_fatal_notifier(mut self, tx: mpsc::UnboundedSender<ConnectionError>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.fatal_tx = Some(tx);
        }
        self
    }

    /// Configured logical database name.
    pub fn database_name(&self) -> &str {
        &self.inner.config.database_name
    }

    /// Returns the shared handle, establishing the session on first use.
    ///
    /// # Errors
    /// Returns the [`ConnectionError`] of the single establishment attempt.
    /// The error is permanent: later calls return it again without a new
    /// attempt.
    pub async fn get(&self) -> Result<C::Handle, ConnectionError> {
        if let Some(outcome) = self.inner.outcome.get() {
            return outcome.clone();
        }
        self.attempt.get_or_init(|| self.start()).clone().await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        match self.inner.outcome.get() {
            Some(Ok(_)) => ConnectionState::Connected,
            Some(Err(_)) => ConnectionState::Failed,
            None if self.attempt.get().is_some() => ConnectionState::Connecting,
            None => ConnectionState::Uninitialized,
        }
    }

    fn start(&self) -> Attempt<C::Handle> {
        let inner = self.inner.clone();
        let task = tokio::spawn(async move { inner.establish().await });
        async move {
            // 任务只会因运行时关闭而中止
            task.await.unwrap_or_else(|e| {
                Err(ConnectionError::Unreachable(format!("connection task aborted: {e}")))
            })
        }
        .boxed()
        .shared()
    }
}

impl<C: Connector> Establisher<C> {
    async fn establish(&self) -> Outcome<C::Handle> {
        let db = self.config.redacted_target();
        tracing::info!(db = %db, "Connecting to database");

        let timeout = self.config.connect_timeout;
        let outcome = match tokio::time::timeout(timeout, self.connector.connect(&self.config)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ConnectionError::Timeout(timeout)),
        };

        match &outcome {
            Ok(_) => tracing::info!(db = %db, "Database connection established"),
            Err(e) => {
                tracing::error!(db = %db, error = %e, "Could not connect to database");
                if let Some(tx) = &self.fatal_tx {
                    // 接收端已关闭时进程已在退出
                    let _ = tx.send(e.clone());
                }
            }
        }
        self.outcome.get_or_init(|| outcome).clone()
    }
}
