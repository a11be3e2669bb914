use std::fmt;

/// Result type for planview-providers operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while talking to a remote source
#[derive(Debug)]
pub enum Error {
    /// IO operation failed
    Io(std::io::Error),

    /// JSON parsing failed
    Json(serde_json::Error),

    /// Remote unreachable or authentication rejected
    Connection(String),

    /// Requested plan, suite, point or test case does not exist
    NotFound(String),

    /// Remote rejected or failed a query
    Query(String),
}

impl Error {
    /// Whether the failure affects the whole remote rather than a single item.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Io(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Connection(msg) => write!(f, "Connection error: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Query(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Connection(_) | Error::NotFound(_) | Error::Query(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
