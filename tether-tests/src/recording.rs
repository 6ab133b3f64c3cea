use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tether::{ConnectionEvent, EventKind, InstrumentationSink};
use time::OffsetDateTime;
use uuid::Uuid;

/// Owned copy of a [`ConnectionEvent`].
#[derive(Clone, Debug)]
pub struct RecordedEvent {
    pub kind: EventKind,
    pub connection_id: Uuid,
    pub instance_id: Uuid,
    pub database: String,
    pub data_source: String,
    pub start: OffsetDateTime,
    pub end: Option<OffsetDateTime>,
    pub duration: Option<Duration>,
    pub is_async: bool,
    pub fault: Option<String>,
    pub cancelled: bool,
}

/// Sink keeping every event, clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|v| v.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|v| v.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|v| v.kind == kind).count()
    }

    pub fn errors(&self) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|v| matches!(v.kind, EventKind::Error(..)))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl InstrumentationSink for RecordingSink {
    fn notify(&self, event: &ConnectionEvent<'_>) {
        let recorded = RecordedEvent {
            kind: event.kind,
            connection_id: event.connection_id,
            instance_id: event.instance_id,
            database: event.database.to_string(),
            data_source: event.data_source.to_string(),
            start: event.start,
            end: event.end,
            duration: event.duration,
            is_async: event.is_async,
            fault: event.fault.map(|e| format!("{:#}", e)),
            cancelled: event.fault.is_some_and(|e| e.is_cancelled()),
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(recorded);
        }
    }
}
