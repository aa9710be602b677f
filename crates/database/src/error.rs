use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid store descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Other(String),
}

impl DatabaseError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} with id {} not found", entity, id))
    }

    pub fn duplicate(entity: &str, field: &str) -> Self {
        Self::DuplicateEntry(format!("{} with {} already exists", entity, field))
    }

    /// Map a unique-constraint violation to `DuplicateEntry`, pass anything else through
    pub fn on_unique(err: sqlx::Error, entity: &str, field: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::duplicate(entity, field)
            }
            _ => Self::ConnectionError(err),
        }
    }
}
