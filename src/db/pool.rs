//! Connection lifecycle management
//!
//! One [`ConnectionManager`] is constructed at process start and handed to
//! the repository by reference; there is no process-wide implicit state.
//! Initialization is lazy and exactly-once: however many callers race on the
//! first `acquire`, a single underlying connection (or pool) is built.

use std::future::Future;
use std::str::FromStr;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};

type ConnectFn<C> = Box<dyn Fn() -> BoxFuture<'static, Result<C>> + Send + Sync>;

/// Clean shutdown hook for a managed connection
#[async_trait]
pub trait Shutdown {
    async fn shutdown(&self);
}

#[async_trait]
impl Shutdown for PgPool {
    async fn shutdown(&self) {
        self.close().await;
    }
}

/// Owns the single backend connection and its exactly-once initialization.
///
/// Generic over the connection type so lifecycle can be tested with fakes.
/// A failed initialization is returned to that caller and leaves the cell
/// empty, so a later `acquire` retries from scratch.
pub struct ConnectionManager<C> {
    cell: OnceCell<C>,
    connect: ConnectFn<C>,
}

impl<C: std::fmt::Debug> std::fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

impl<C> ConnectionManager<C> {
    /// Build a manager around an async connect factory
    pub fn new<F, Fut>(connect: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            connect: Box::new(move || Box::pin(connect())),
        }
    }

    /// Get the shared connection, constructing it on first use.
    ///
    /// Safe under concurrent first call: the factory runs at most once per
    /// attempt and every successful caller observes the same instance.
    pub async fn acquire(&self) -> Result<&C> {
        self.cell.get_or_try_init(|| (self.connect)()).await
    }

    /// The connection, if one has been constructed
    pub fn get(&self) -> Option<&C> {
        self.cell.get()
    }
}

impl<C: Shutdown> ConnectionManager<C> {
    /// Close the connection. Idempotent; a never-initialized manager is a
    /// no-op, as is a second call.
    pub async fn close(&self) {
        if let Some(conn) = self.cell.get() {
            conn.shutdown().await;
            tracing::info!("backend connection closed");
        }
    }
}

impl ConnectionManager<PgPool> {
    /// Manager for a Postgres pool described by configuration.
    ///
    /// The connection string is parsed eagerly so misconfiguration fails at
    /// startup; reachability problems surface on first `acquire` as
    /// [`ArchiveError::Connect`].
    pub fn postgres(config: &ArchiveConfig) -> Result<Self> {
        let url = config.database_url()?;
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| ArchiveError::config(format!("invalid DATABASE_URL: {}", e)))?;
        let max_connections = config.max_connections;

        Ok(Self::new(move || {
            let options = options.clone();
            async move {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect_with(options)
                    .await?;
                tracing::info!(max_connections, "postgres pool created");
                Ok(pool)
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FakeConn(usize);

    #[async_trait]
    impl Shutdown for FakeConn {
        async fn shutdown(&self) {}
    }

    #[tokio::test]
    async fn concurrent_first_acquire_builds_one_connection() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let manager = Arc::new(ConnectionManager::new(move || {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                Ok(FakeConn(counter.fetch_add(1, Ordering::SeqCst)))
            }
        }));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.acquire().await.map(|c| c.0) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 0);
        }
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn acquire_is_cached_after_first_success() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let manager = ConnectionManager::new(move || {
            let counter = counter.clone();
            async move { Ok(FakeConn(counter.fetch_add(1, Ordering::SeqCst))) }
        });

        manager.acquire().await.unwrap();
        manager.acquire().await.unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_init_leaves_cell_empty_for_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let manager = ConnectionManager::new(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ArchiveError::config("first attempt refused"))
                } else {
                    Ok(FakeConn(99))
                }
            }
        });

        assert!(manager.acquire().await.is_err());
        assert!(manager.get().is_none());
        assert_eq!(manager.acquire().await.unwrap().0, 99);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_safe_when_uninitialized() {
        let manager: ConnectionManager<FakeConn> =
            ConnectionManager::new(|| async { Ok(FakeConn(0)) });

        // Never initialized
        manager.close().await;

        manager.acquire().await.unwrap();
        manager.close().await;
        manager.close().await;
    }

    #[test]
    fn postgres_manager_rejects_malformed_url() {
        let config = ArchiveConfig {
            backend: crate::config::BackendKind::Relational,
            database_url: Some("not a url at all ::".to_owned()),
            document_path: None,
            max_connections: 2,
        };
        let err = ConnectionManager::postgres(&config).unwrap_err();
        assert!(matches!(err, ArchiveError::Config { .. }));
    }
}
