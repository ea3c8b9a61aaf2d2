use thiserror::Error;

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// The closed set of storage-layer failures. Driver faults are mapped at
/// this boundary: integrity-violation SQLSTATEs become the typed kinds a
/// caller can act on, everything else is an opaque `Database` wrap.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid variant: {0}")]
    InvalidVariant(String),

    #[error("missing tenant id in request scope")]
    MissingTenantID,

    #[error("missing project id in request scope")]
    MissingProjectID,

    #[error("{msg}")]
    Msg {
        msg: String,
        #[source]
        source: Box<StorageError>,
    },
}

impl StorageError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StorageError::NotFound(what.into())
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        StorageError::AlreadyExists(what.into())
    }

    /// An integrity fault detected by the engine itself, e.g. a written
    /// directory entry that fails to round-trip.
    pub fn integrity(message: impl Into<String>) -> Self {
        StorageError::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Annotate with context, preserving the underlying error's identity.
    pub fn with_msg(self, msg: impl Into<String>) -> Self {
        StorageError::Msg {
            msg: msg.into(),
            source: Box::new(self),
        }
    }

    /// The error with any `Msg` annotations stripped.
    pub fn root(&self) -> &StorageError {
        match self {
            StorageError::Msg { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), StorageError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self.root(), StorageError::AlreadyExists(_))
    }
}

// SQLSTATE class 23 (integrity violations) carries the useful signal:
// 23505 unique_violation, 23503 foreign_key_violation (a named parent row
// is absent), 23514 check_violation (a format constraint was broken).
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        let mapped = match &err {
            sqlx::Error::RowNotFound => Some(StorageError::NotFound("no rows returned".into())),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("23505") => Some(StorageError::AlreadyExists(db.message().to_string())),
                Some("23503") => Some(StorageError::InvalidCatalog(db.message().to_string())),
                Some("23514") => Some(StorageError::InvalidInput(db.message().to_string())),
                _ => None,
            },
            _ => None,
        };
        mapped.unwrap_or_else(|| StorageError::Database {
            message: err.to_string(),
            source: Some(err),
        })
    }
}
