use crate::Error;

pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;

/// Failure surfaced by a managed connection.
///
/// Resource faults are carried unchanged, the driver's `anyhow` chain stays
/// reachable through [`std::error::Error::source`] and [`ConnectionError::fault`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Invalid construction input or setting.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    /// The call does not make sense in the current transaction state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    /// The underlying resource failed.
    #[error(transparent)]
    Resource(Error),
    /// An asynchronous operation was cancelled before completing.
    #[error("The operation was cancelled")]
    Cancelled,
}

impl ConnectionError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The original resource fault, if this is a resource error.
    pub fn fault(&self) -> Option<&Error> {
        match self {
            Self::Resource(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for ConnectionError {
    fn from(value: Error) -> Self {
        Self::Resource(value)
    }
}
