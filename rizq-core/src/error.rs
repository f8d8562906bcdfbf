use thiserror::Error;

/// Error taxonomy shared across the data layer, the auth boundary, and the
/// HTTP surface. Nothing here is fatal at the process level; every variant is
/// scoped to a single operation and surfaced to the caller.
#[derive(Debug, Error)]
pub enum RizqError {
    /// A query returned zero rows where exactly one was expected.
    #[error("{what} not found")]
    NotFound { what: String },

    /// A collaborator (database endpoint, auth service) answered with a
    /// non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Input rejected before any I/O was attempted.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Missing or invalid session at the time of a privileged operation.
    #[error("auth error: {0}")]
    Auth(String),

    /// Local key-value store failure.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl RizqError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RizqError>;
