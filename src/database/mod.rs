// Database module
// Owns the lazily-initialized backend connection (SQLite + sqlite-vec or
// Postgres + pgvector) and the query execution path.


pub mod executor;
pub mod models;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{BackendKind, Config, PostgresConfig};
use crate::{Result, RetrievalError};

/// Live pool for the selected backend variant.
#[derive(Debug)]
pub enum BackendPool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

/// A validated backend connection handed out by the manager.
#[derive(Debug)]
pub struct BackendHandle {
    pool: BackendPool,
    vector_search: bool,
}

impl BackendHandle {
    #[inline]
    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    /// Whether the backend can evaluate vector-distance expressions.
    /// False only for SQLite when the sqlite-vec extension failed to load;
    /// vector-scored queries against such a handle fail at execution.
    #[inline]
    pub fn supports_vector_search(&self) -> bool {
        self.vector_search
    }
}

// Lifecycle: Uninitialized -> (connecting, under the state lock) -> Ready,
// or -> Failed, from which the next acquisition retries the connect.
#[derive(Debug)]
enum ManagerState {
    Uninitialized,
    Ready(Arc<BackendHandle>),
    Failed,
}

/// Owns the process-lifetime backend connection.
///
/// Explicitly constructed and injected rather than global: create once,
/// share via `Arc`, `close` when done. The pool-of-one underneath preserves
/// single-shared-connection semantics while the pool arbitrates concurrent
/// access.
#[derive(Debug)]
pub struct ConnectionManager {
    backend: BackendKind,
    bootstrap_script: PathBuf,
    postgres: PostgresConfig,
    state: Mutex<ManagerState>,
}

impl ConnectionManager {
    #[inline]
    pub fn new(config: &Config) -> Self {
        Self {
            backend: config.backend,
            bootstrap_script: config.bootstrap_script.clone(),
            postgres: config.postgres.clone(),
            state: Mutex::new(ManagerState::Uninitialized),
        }
    }

    #[inline]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend
    }

    /// Return the cached handle, connecting (and bootstrapping) on first use.
    /// A failed attempt is retried on the next acquisition.
    #[inline]
    pub async fn acquire(&self) -> Result<Arc<BackendHandle>> {
        let mut state = self.state.lock().await;

        if let ManagerState::Ready(handle) = &*state {
            return Ok(Arc::clone(handle));
        }

        debug!("Connecting {} backend", self.backend);
        match self.connect().await {
            Ok(handle) => {
                let handle = Arc::new(handle);
                *state = ManagerState::Ready(Arc::clone(&handle));
                info!("{} backend ready", self.backend);
                Ok(handle)
            }
            Err(e) => {
                *state = ManagerState::Failed;
                warn!("Failed to connect {} backend: {:#}", self.backend, e);
                Err(RetrievalError::Connection(format!("{e:#}")))
            }
        }
    }

    /// Close the underlying pool and return to the uninitialized state.
    #[inline]
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if let ManagerState::Ready(handle) = std::mem::replace(&mut *state, ManagerState::Uninitialized)
        {
            match &handle.pool {
                BackendPool::Sqlite(pool) => pool.close().await,
                BackendPool::Postgres(pool) => pool.close().await,
            }
            debug!("{} backend closed", self.backend);
        }
    }

    async fn connect(&self) -> anyhow::Result<BackendHandle> {
        match self.backend {
            BackendKind::Sqlite => self.connect_sqlite().await,
            BackendKind::Postgres => self.connect_postgres().await,
        }
    }

    async fn connect_sqlite(&self) -> anyhow::Result<BackendHandle> {
        let script_path = &self.bootstrap_script;
        let script = fs::read_to_string(script_path).with_context(|| {
            format!("Failed to read bootstrap script: {}", script_path.display())
        })?;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Failed to build SQLite options")?;

        // Try to load the vector-similarity extension; its absence degrades
        // vector scoring but is not fatal.
        let (pool, vector_search) = match Self::sqlite_pool(options.clone().extension("vec0")).await
        {
            Ok(pool) => (pool, true),
            Err(e) => {
                warn!(
                    "Failed to load sqlite-vec extension: {:#}; vector scoring unavailable",
                    e
                );
                (Self::sqlite_pool(options).await?, false)
            }
        };

        sqlx::raw_sql(&script)
            .execute(&pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to hydrate database from {}",
                    script_path.display()
                )
            })?;

        info!(
            "SQLite database created and loaded from {}",
            script_path.display()
        );

        Ok(BackendHandle {
            pool: BackendPool::Sqlite(pool),
            vector_search,
        })
    }

    async fn sqlite_pool(options: SqliteConnectOptions) -> anyhow::Result<SqlitePool> {
        // The single pooled connection owns the in-memory database; letting
        // it be reaped would drop the data.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;
        Ok(pool)
    }

    async fn connect_postgres(&self) -> anyhow::Result<BackendHandle> {
        let options = PgConnectOptions::new()
            .host(&self.postgres.host)
            .port(self.postgres.port)
            .username(&self.postgres.user)
            .password(&self.postgres.password)
            .database(&self.postgres.dbname);

        // Pool-of-one; connections are revalidated before reuse, so a dropped
        // session reconnects transparently on the next acquisition.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to Postgres at {}:{}",
                    self.postgres.host, self.postgres.port
                )
            })?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .context("Liveness probe failed")?;

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&pool)
            .await
            .context("Failed to enable the vector extension")?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT to_regclass('public.activities')::text")
                .fetch_one(&pool)
                .await
                .context("Failed to check for the activities table")?;

        if existing.is_none() {
            let script_path = &self.bootstrap_script;
            let script = fs::read_to_string(script_path).with_context(|| {
                format!("Failed to read bootstrap script: {}", script_path.display())
            })?;
            let filtered = filter_sqlite_directives(&script);

            sqlx::raw_sql(&filtered)
                .execute(&pool)
                .await
                .context("Failed to initialize Postgres database")?;
            info!(
                "Postgres database initialized from {}",
                script_path.display()
            );
        } else {
            debug!("Postgres activities table already exists");
        }

        Ok(BackendHandle {
            pool: BackendPool::Postgres(pool),
            vector_search: true,
        })
    }
}

/// Strip SQLite-only directives (PRAGMA lines) from the bootstrap script so
/// the remainder is valid for Postgres.
fn filter_sqlite_directives(script: &str) -> String {
    script
        .lines()
        .filter(|line| !line.trim_start().to_uppercase().starts_with("PRAGMA"))
        .collect::<Vec<_>>()
        .join("\n")
}
