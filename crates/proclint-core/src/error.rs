//! Error types for plugin linting operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for plugin linting operations
#[derive(Debug, Error)]
pub enum ProclintError {
    /// Input classification or materialization errors
    #[error("Input error: {message}")]
    InputError { message: String },

    /// Download of a remote archive failed
    #[error("Download failed for '{url}': {source}")]
    DownloadError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Git clone of a remote repository failed
    #[error("Clone failed for '{url}': {message}")]
    CloneError { url: String, message: String },

    /// Archive extraction or archive entry access failed
    #[error("Archive error for '{path}': {source}")]
    ArchiveError {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The external build tool returned a non-zero exit code
    #[error("Build failed with exit code {exit_code}")]
    BuildError { exit_code: i32 },

    /// No process plugin descriptor was found in the working tree
    #[error("Discovery error: {message}")]
    DiscoveryError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Per-file parse errors (BPMN XML, FHIR XML/JSON, class files)
    #[error("Parse error in '{file}': {message}")]
    ParseError { file: String, message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Download,
    Clone,
    Archive,
    Build,
    Discovery,
    Io,
    Parse,
    Internal,
}

impl ProclintError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProclintError::InputError { .. } => ErrorKind::Input,
            ProclintError::DownloadError { .. } => ErrorKind::Download,
            ProclintError::CloneError { .. } => ErrorKind::Clone,
            ProclintError::ArchiveError { .. } => ErrorKind::Archive,
            ProclintError::BuildError { .. } => ErrorKind::Build,
            ProclintError::DiscoveryError { .. } => ErrorKind::Discovery,
            ProclintError::IoError { .. } => ErrorKind::Io,
            ProclintError::ParseError { .. } => ErrorKind::Parse,
            ProclintError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error terminates the whole run. Parse errors are local
    /// (the affected file becomes an UNPARSABLE finding); everything else
    /// aborts.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Parse)
    }

    /// Create an input error
    pub fn input_error(message: impl Into<String>) -> Self {
        Self::InputError {
            message: message.into(),
        }
    }

    /// Create a clone error
    pub fn clone_error(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CloneError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a build error carrying the builder's exit code
    pub fn build_error(exit_code: i32) -> Self {
        Self::BuildError { exit_code }
    }

    /// Create a discovery error
    pub fn discovery_error(message: impl Into<String>) -> Self {
        Self::DiscoveryError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error
    pub fn parse_error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for ProclintError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}
