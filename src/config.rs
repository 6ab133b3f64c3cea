use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};
use tether_core::{AmbientContext, ConnectionError, ConnectionResult, InstrumentationSink};

/// Construction input of a [`ManagedConnection`](crate::ManagedConnection).
///
/// Exactly one of connection string and resource must be supplied: with a
/// connection string the manager creates and owns the resource, with a
/// resource the caller keeps the ownership and the manager will never dispose
/// it.
///
/// ```rust,ignore
/// let options = ConnectionOptions::new()
///     .connection_string("db=test;host=localhost")
///     .command_timeout(30);
/// let connection = ManagedConnection::new(driver, options)?;
/// ```
pub struct ConnectionOptions<R> {
    pub(crate) connection_string: Option<String>,
    pub(crate) resource: Option<R>,
    pub(crate) command_timeout: Option<i32>,
    pub(crate) sink: Option<Arc<dyn InstrumentationSink>>,
    pub(crate) ambient: Option<Arc<dyn AmbientContext>>,
}

impl<R> ConnectionOptions<R> {
    pub fn new() -> Self {
        Self {
            connection_string: None,
            resource: None,
            command_timeout: None,
            sink: None,
            ambient: None,
        }
    }

    pub fn connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    pub fn resource(mut self, resource: R) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Seconds, handed over to command execution. Must not be negative.
    pub fn command_timeout(mut self, seconds: i32) -> Self {
        self.command_timeout = Some(seconds);
        self
    }

    /// Replaces the default [`LogSink`](crate::LogSink).
    pub fn sink(mut self, sink: impl InstrumentationSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Replaces the default [`NoAmbientContext`](tether_core::NoAmbientContext).
    pub fn ambient(mut self, ambient: impl AmbientContext + 'static) -> Self {
        self.ambient = Some(Arc::new(ambient));
        self
    }

    pub(crate) fn validate(&self) -> ConnectionResult<()> {
        let error = match (&self.connection_string, &self.resource) {
            (Some(..), Some(..)) => Some(
                "Both a connection string and a resource were supplied, only one of them can be used",
            ),
            (None, None) => Some("Either a connection string or a resource must be supplied"),
            (Some(v), None) if v.trim().is_empty() => Some("The connection string cannot be empty"),
            _ => None,
        };
        if let Some(error) = error {
            let error = ConnectionError::configuration(error);
            log::error!("{:#}", error);
            return Err(error);
        }
        validate_command_timeout(self.command_timeout)
    }
}

impl<R> Default for ConnectionOptions<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Debug for ConnectionOptions<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("connection_string", &self.connection_string)
            .field("resource", &self.resource.as_ref().map(|_| ".."))
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

pub fn validate_command_timeout(seconds: Option<i32>) -> ConnectionResult<()> {
    match seconds {
        Some(v) if v < 0 => {
            let error = ConnectionError::configuration(format!(
                "The command timeout must be a non negative number of seconds, got {}",
                v
            ));
            log::error!("{:#}", error);
            Err(error)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionOptions, validate_command_timeout};
    use tether_core::ConnectionError;

    #[test]
    fn exactly_one_source() {
        let neither = ConnectionOptions::<()>::new();
        assert!(matches!(
            neither.validate(),
            Err(ConnectionError::Configuration(..))
        ));

        let both = ConnectionOptions::new()
            .connection_string("db=test")
            .resource(());
        assert!(matches!(
            both.validate(),
            Err(ConnectionError::Configuration(..))
        ));

        let blank = ConnectionOptions::<()>::new().connection_string("  ");
        assert!(matches!(
            blank.validate(),
            Err(ConnectionError::Configuration(..))
        ));

        assert!(
            ConnectionOptions::<()>::new()
                .connection_string("db=test")
                .validate()
                .is_ok()
        );
        assert!(ConnectionOptions::new().resource(()).validate().is_ok());
    }

    #[test]
    fn command_timeout() {
        assert!(validate_command_timeout(None).is_ok());
        assert!(validate_command_timeout(Some(0)).is_ok());
        assert!(validate_command_timeout(Some(30)).is_ok());
        assert!(matches!(
            validate_command_timeout(Some(-1)),
            Err(ConnectionError::Configuration(..))
        ));
        assert!(
            ConnectionOptions::<()>::new()
                .connection_string("db=test")
                .command_timeout(-5)
                .validate()
                .is_err()
        );
    }
}
