use crate::ConnectionEvent;
use std::sync::Arc;

/// Receives the instrumentation stream of a managed connection.
///
/// Called synchronously from the manager, implementations should be quick and
/// must not call back into the connection.
pub trait InstrumentationSink: Send + Sync {
    fn notify(&self, event: &ConnectionEvent<'_>);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl InstrumentationSink for NoopSink {
    fn notify(&self, _event: &ConnectionEvent<'_>) {}
}

impl<S: InstrumentationSink + ?Sized> InstrumentationSink for Arc<S> {
    fn notify(&self, event: &ConnectionEvent<'_>) {
        (**self).notify(event)
    }
}

/// Forwards each event to every sink, in order.
impl InstrumentationSink for Vec<Arc<dyn InstrumentationSink>> {
    fn notify(&self, event: &ConnectionEvent<'_>) {
        for sink in self {
            sink.notify(event);
        }
    }
}
