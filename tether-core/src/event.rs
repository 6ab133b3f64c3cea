use crate::{ConnectionError, IsolationLevel};
use std::{
    fmt::{self, Display, Formatter},
    time::{Duration, Instant},
};
use time::OffsetDateTime;
use uuid::Uuid;

/// Physical operation an event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Close,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Open => "open",
            Operation::Close => "close",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Opening,
    Opened,
    Closing,
    Closed,
    BeginTransaction(IsolationLevel),
    Error(Operation),
}

impl EventKind {
    /// `true` for the events emitted before a physical action.
    pub fn is_starting(&self) -> bool {
        matches!(
            self,
            EventKind::Opening | EventKind::Closing | EventKind::BeginTransaction(..)
        )
    }
}

/// Instrumentation event, emitted and forgotten.
///
/// Borrows from the manager for the duration of the notification, sinks that
/// need to keep it must copy what they are interested in.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionEvent<'a> {
    pub kind: EventKind,
    pub connection_id: Uuid,
    /// Correlates the starting event with its outcome.
    pub instance_id: Uuid,
    pub database: &'a str,
    pub data_source: &'a str,
    pub start: OffsetDateTime,
    /// Absent for starting events.
    pub end: Option<OffsetDateTime>,
    pub duration: Option<Duration>,
    pub is_async: bool,
    pub fault: Option<&'a ConnectionError>,
}

/// Timing of one instrumented operation.
///
/// The wall clock is sampled once at the start, the end is derived from a
/// monotonic clock so that `end >= start` always holds.
#[derive(Clone, Copy, Debug)]
pub struct EventTimer {
    pub instance_id: Uuid,
    pub start: OffsetDateTime,
    started: Instant,
}

impl EventTimer {
    pub fn start() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            start: OffsetDateTime::now_utc(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns the end timestamp together with the elapsed time.
    pub fn stop(&self) -> (OffsetDateTime, Duration) {
        let elapsed = self.elapsed();
        (self.start + elapsed, elapsed)
    }
}

impl Default for EventTimer {
    fn default() -> Self {
        Self::start()
    }
}
