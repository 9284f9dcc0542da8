use crate::query::QueryError;

/// Failure of a repository operation.
#[derive(Debug)]
pub enum DataError {
    /// A single-row lookup matched nothing. Expected; never logged.
    NotFound(String),
    /// The driver reported a failure (connection, syntax, constraint, ...).
    Database(Box<dyn std::error::Error + Send + Sync>),
    /// The statement could not be built.
    Query(QueryError),
    Other(String),
}

impl DataError {
    /// Wrap a driver error.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn not_found(entity: &str) -> Self {
        DataError::NotFound(format!("{entity}: record not found"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(msg) => f.write_str(msg),
            Self::Database(err) => write!(f, "database: {err}"),
            Self::Query(err) => write!(f, "invalid query: {err}"),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err.as_ref()),
            Self::Query(err) => Some(err),
            Self::NotFound(_) | Self::Other(_) => None,
        }
    }
}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        DataError::Query(err)
    }
}
