use tether_core::{ConnectionEvent, EventKind, InstrumentationSink};

/// Default sink, renders the instrumentation stream through `log`.
///
/// Boundaries are logged at debug level, failures at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl InstrumentationSink for LogSink {
    fn notify(&self, event: &ConnectionEvent<'_>) {
        let kind = if event.is_async { " (async)" } else { "" };
        match event.kind {
            EventKind::Opening => log::debug!(
                "Opening connection {} to database `{}` on `{}`{}",
                event.connection_id,
                event.database,
                event.data_source,
                kind
            ),
            EventKind::Opened => log::debug!(
                "Opened connection {} to database `{}` on `{}` in {:?}{}",
                event.connection_id,
                event.database,
                event.data_source,
                event.duration.unwrap_or_default(),
                kind
            ),
            EventKind::Closing => log::debug!(
                "Closing connection {} to database `{}` on `{}`{}",
                event.connection_id,
                event.database,
                event.data_source,
                kind
            ),
            EventKind::Closed => log::debug!(
                "Closed connection {} to database `{}` on `{}` in {:?}{}",
                event.connection_id,
                event.database,
                event.data_source,
                event.duration.unwrap_or_default(),
                kind
            ),
            EventKind::BeginTransaction(isolation_level) => log::debug!(
                "Beginning transaction with isolation level {} on connection {}{}",
                isolation_level,
                event.connection_id,
                kind
            ),
            EventKind::Error(operation) => match event.fault {
                Some(fault) => log::error!(
                    "Failed to {} connection {} to database `{}` on `{}` after {:?}{}: {:#}",
                    operation,
                    event.connection_id,
                    event.database,
                    event.data_source,
                    event.duration.unwrap_or_default(),
                    kind,
                    fault
                ),
                None => log::error!(
                    "Failed to {} connection {} to database `{}` on `{}` after {:?}{}",
                    operation,
                    event.connection_id,
                    event.database,
                    event.data_source,
                    event.duration.unwrap_or_default(),
                    kind
                ),
            },
        }
    }
}
