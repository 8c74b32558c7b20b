//! Error types module
//!
//! All errors in the pipeline are unified under [`AppError`]. The worker and
//! the dispatch service classify the same enum two different ways: the
//! dispatch service maps variants to an HTTP status via [`ErrorMetadata`];
//! the worker's retry middleware asks [`AppError::is_retryable`] to decide
//! whether to re-deliver or poison the message.

/// Log level for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

/// Defines how an error should be presented at the HTTP boundary.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;
    fn error_code(&self) -> &'static str;
    fn is_recoverable(&self) -> bool;
    fn client_message(&self) -> String;
    fn log_level(&self) -> LogLevel;
}

/// Errors produced anywhere in the upload pipeline.
///
/// Kinds map to §7 of the spec: `InvalidInput`, `NotFound`, `UpstreamTransient`,
/// `UpstreamFatal`. `PartialSuccess` and `PoisonTerminal` are not represented
/// here — they are worker-side control flow, not error values.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Validation, content-type, or prefix-shape failure. 400 at the HTTP boundary.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing object or metadata row. 404 at the HTTP boundary; retried at the
    /// worker boundary (the row or object may simply not have landed yet).
    #[error("not found: {0}")]
    NotFound(String),

    /// Object-store, metadata-store, broker, or cache I/O failure.
    /// Retry-eligible in the worker pipeline; 500 with no in-process retry at
    /// the HTTP boundary.
    #[error("upstream error: {0}")]
    UpstreamTransient(#[source] anyhow::Error),

    /// Malformed configuration or an unregistered strategy. Never retried —
    /// retrying cannot fix it.
    #[error("fatal configuration error: {0}")]
    UpstreamFatal(String),

    /// Internal invariant violated; not expected to be seen by a caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the worker's retry middleware should re-deliver the message.
    ///
    /// `UpstreamFatal` skips straight to the poison path — see §7: "wrapped so
    /// retry does not help".
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::UpstreamTransient(_) | AppError::NotFound(_))
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::UpstreamTransient(_) => 500,
            AppError::UpstreamFatal(_) => 500,
            AppError::Internal(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UpstreamTransient(_) => "UPSTREAM_TRANSIENT",
            AppError::UpstreamFatal(_) => "UPSTREAM_FATAL",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    fn is_recoverable(&self) -> bool {
        self.is_retryable()
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            _ => "an internal error occurred".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::NotFound(_) => LogLevel::Debug,
            AppError::UpstreamTransient(_) => LogLevel::Warn,
            AppError::UpstreamFatal(_) | AppError::Internal(_) => LogLevel::Error,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            other => AppError::UpstreamTransient(other.into()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::UpstreamTransient(err.into())
    }
}
