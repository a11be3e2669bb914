use std::fmt;

/// Result type for planview-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug)]
pub enum Error {
    /// A node path could not be parsed
    InvalidPath(String),

    /// An outcome or state name was not recognized
    UnknownVariant(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPath(msg) => write!(f, "Invalid node path: {}", msg),
            Error::UnknownVariant(msg) => write!(f, "Unknown value: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
