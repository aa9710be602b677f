use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Alias of the shared store that holds tenant-independent data
pub const DEFAULT_ALIAS: &str = "default";

/// File name of the shared default store inside the storage directory
pub const DEFAULT_STORE_FILE: &str = "db_core.sqlite3";

/// Storage engine backing a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Sqlite,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Connection template (engine + pooling parameters) shared by the default
/// store and every tenant store. Tenant descriptors are cloned from it with
/// only the location changed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreTemplate {
    pub engine: Engine,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Default for StoreTemplate {
    fn default() -> Self {
        Self {
            engine: Engine::Sqlite,
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreTemplate {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            engine: Engine::Sqlite,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.min_connections),
            acquire_timeout: env_parse("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
            idle_timeout: env_parse("DATABASE_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            busy_timeout: env_parse("DATABASE_BUSY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.busy_timeout),
        }
    }

    /// Clone this template into a descriptor for the given location
    pub fn descriptor(&self, location: impl Into<PathBuf>) -> StoreDescriptor {
        StoreDescriptor {
            template: self.clone(),
            location: location.into(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Fully resolved connection descriptor for one physical store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDescriptor {
    pub template: StoreTemplate,
    pub location: PathBuf,
}

impl StoreDescriptor {
    pub fn engine(&self) -> Engine {
        self.template.engine
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Whether the physical store exists at `location`
    pub fn exists(&self) -> bool {
        self.location.is_file()
    }

    /// Check that the descriptor still points at usable storage
    pub fn validate(&self) -> Result<()> {
        if self.location.as_os_str().is_empty() {
            return Err(DatabaseError::InvalidDescriptor(
                "store location is empty".to_string(),
            ));
        }
        if !self.exists() {
            return Err(DatabaseError::InvalidDescriptor(format!(
                "store file {} does not exist",
                self.location.display()
            )));
        }
        Ok(())
    }

    fn connect_options(&self, create_if_missing: bool) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.location)
            .create_if_missing(create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(self.template.busy_timeout)
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .max_connections(self.template.max_connections)
            .min_connections(self.template.min_connections)
            .acquire_timeout(self.template.acquire_timeout)
            .idle_timeout(self.template.idle_timeout)
    }
}

/// Process-level storage configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Directory holding the default store and every tenant store
    pub storage_dir: PathBuf,
    pub template: StoreTemplate,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data"),
            template: StoreTemplate::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            storage_dir: std::env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::default().storage_dir),
            template: StoreTemplate::from_env(),
        }
    }

    pub fn default_descriptor(&self) -> StoreDescriptor {
        self.template
            .descriptor(self.storage_dir.join(DEFAULT_STORE_FILE))
    }

    /// Descriptor for a tenant store named by its storage id
    pub fn tenant_descriptor(&self, storage_id: &str) -> StoreDescriptor {
        self.template
            .descriptor(self.storage_dir.join(format!("db_{}.sqlite3", storage_id)))
    }
}

/// Handle to one physical store: a routing alias plus its connection pool.
/// Cloning is cheap and clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    alias: Arc<str>,
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the shared default store
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.storage_dir).await?;
        Self::open(DEFAULT_ALIAS, &config.default_descriptor(), true).await
    }

    /// Eagerly connect to the store described by `descriptor`
    pub async fn open(
        alias: &str,
        descriptor: &StoreDescriptor,
        create_if_missing: bool,
    ) -> Result<Self> {
        let pool = descriptor
            .pool_options()
            .connect_with(descriptor.connect_options(create_if_missing))
            .await?;

        Ok(Self {
            alias: Arc::from(alias),
            pool,
        })
    }

    /// Build a handle without touching the disk. Connections are opened on
    /// first use and never create the file.
    pub fn connect_lazy(alias: &str, descriptor: &StoreDescriptor) -> Self {
        let pool = descriptor
            .pool_options()
            .connect_lazy_with(descriptor.connect_options(false));

        Self {
            alias: Arc::from(alias),
            pool,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn is_default(&self) -> bool {
        &*self.alias == DEFAULT_ALIAS
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
