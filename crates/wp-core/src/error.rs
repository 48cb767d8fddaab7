//! Unified error type for the watchparty application.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`]
//! and a stable machine-readable code via [`Error::code`].

/// Unified error type covering all failure modes in watchparty.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required request field was absent or empty.
    #[error("{0}")]
    MissingInput(String),

    /// The metadata extractor produced no usable data or raised a fault.
    ///
    /// The message is the extractor's own text, passed through verbatim.
    #[error("{0}")]
    ExtractionFailed(String),

    /// Writing a playlist entry failed.
    #[error("Failed to save video: {0}")]
    PersistenceFailed(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (yt-dlp) could not be run.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    ///
    /// Ingestion failures are all reported as client errors (400).
    pub fn http_status(&self) -> u16 {
        match self {
            Error::MissingInput(_) => 400,
            Error::ExtractionFailed(_) => 400,
            Error::PersistenceFailed(_) => 400,
            Error::Validation(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Internal(_) => 500,
        }
    }

    /// Stable snake_case code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingInput(_) => "missing_input",
            Error::ExtractionFailed(_) => "extraction_failed",
            Error::PersistenceFailed(_) => "persistence_failed",
            Error::Validation(_) => "validation_error",
            Error::Unauthorized(_) => "unauthorized",
            Error::Database { .. } => "database_error",
            Error::Io { .. } => "io_error",
            Error::Tool { .. } => "tool_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
