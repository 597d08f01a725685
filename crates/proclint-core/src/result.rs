//! Result type alias for plugin linting operations

use crate::error::ProclintError;

/// Standard Result type for plugin linting operations
pub type Result<T> = std::result::Result<T, ProclintError>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Turn a local (non-fatal) error into `Ok(None)`, keeping fatal errors
    fn local(self) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn local(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if !err.is_fatal() => {
                tracing::debug!("Continuing after local error: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
