use std::fmt;

/// Result type for planview-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Remote source error
    Provider(planview_providers::Error),

    /// Cache layer error
    Index(planview_index::Error),

    /// Export failed
    Engine(planview_engine::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// The operation was cancelled before it finished
    Cancelled,

    /// A background sync currently owns the remote
    Busy,

    /// Invalid operation or state
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Provider(err) => write!(f, "Provider error: {}", err),
            Error::Index(err) => write!(f, "Index error: {}", err),
            Error::Engine(err) => write!(f, "Export error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Cancelled => write!(f, "Operation cancelled"),
            Error::Busy => write!(f, "A sync is already running"),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Provider(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Engine(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Config(_) | Error::Cancelled | Error::Busy | Error::InvalidOperation(_) => None,
        }
    }
}

impl From<planview_providers::Error> for Error {
    fn from(err: planview_providers::Error) -> Self {
        Error::Provider(err)
    }
}

impl From<planview_index::Error> for Error {
    fn from(err: planview_index::Error) -> Self {
        Error::Index(err)
    }
}

impl From<planview_engine::Error> for Error {
    fn from(err: planview_engine::Error) -> Self {
        Error::Engine(err)
    }
}

impl From<planview_core::Error> for Error {
    fn from(err: planview_core::Error) -> Self {
        match err {
            planview_core::Error::Io(err) => Error::Io(err),
            planview_core::Error::Config(msg) => Error::Config(msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
