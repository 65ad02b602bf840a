//! Error types returned by every public client operation.

use crate::util::Status;

/// Error type for client operations.
///
/// Every public operation either returns a value or one of these two kinds;
/// the store's own [`Status`] only ever appears as the source of
/// [`Error::Service`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required parameter was blank or missing. Raised before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by the store or its connection layer.
    #[error("service error: {source}")]
    Service {
        #[source]
        source: Status,
    },
}

impl Error {
    /// The store failure behind a [`Error::Service`], if any.
    pub fn status(&self) -> Option<&Status> {
        match self {
            Error::Service { source } => Some(source),
            Error::InvalidArgument(_) => None,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}

impl From<Status> for Error {
    fn from(source: Status) -> Self {
        Error::Service { source }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fails with [`Error::InvalidArgument`] when `value` is empty or whitespace.
pub(crate) fn require_not_blank(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{what} must not be blank")));
    }
    Ok(())
}
