use crate::{ConnectionOptions, LogSink, ManagedTransaction, TransactionOf, validate_command_timeout};
use std::{pin::pin, sync::Arc};
use tether_core::{
    AmbientContext, CancellationToken, ConnectionError, ConnectionEvent, ConnectionResult,
    ConnectionState, Context, Driver, EventKind, EventTimer, InstrumentationSink, LazySlot,
    NoAmbientContext, Operation, Resource, Result,
    future::{self, Either},
};
use uuid::Uuid;

pub(crate) enum ResourceSlot<R> {
    /// Created from the connection string, disposed and recreated by the manager.
    Owned(LazySlot<R>),
    /// Supplied by the caller, never disposed.
    External(R),
    /// The resource was handed back through `into_resource`.
    Detached,
}

/// One logical connection shared by many callers.
///
/// The physical connection is opened by the first [`open`](Self::open) and
/// closed by the [`close`](Self::close) that balances it, provided this
/// manager was the one that opened it. A resource that was already open when
/// supplied is never closed here.
///
/// # Single owner
/// The open count and the current transaction are plain fields, not guarded
/// by any lock: every state changing method takes `&mut self`, one manager
/// serves one logical caller at a time. Wrap it in a mutex to share it.
pub struct ManagedConnection<D: Driver> {
    id: Uuid,
    connection_string: Option<String>,
    pub(crate) resource: ResourceSlot<D::Resource>,
    command_timeout: Option<i32>,
    open_count: usize,
    opened_internally: bool,
    pub(crate) transaction: Option<ManagedTransaction<TransactionOf<D>>>,
    pub(crate) enlisted: Option<Uuid>,
    sink: Arc<dyn InstrumentationSink>,
    pub(crate) ambient: Arc<dyn AmbientContext>,
}

impl<D: Driver> ManagedConnection<D> {
    pub fn new(driver: D, options: ConnectionOptions<D::Resource>) -> ConnectionResult<Self> {
        options.validate()?;
        let ConnectionOptions {
            connection_string,
            resource,
            command_timeout,
            sink,
            ambient,
        } = options;
        let resource = match (&connection_string, resource) {
            (_, Some(resource)) => ResourceSlot::External(resource),
            (Some(connection_string), None) => {
                let driver = Arc::new(driver);
                let connection_string = connection_string.clone();
                ResourceSlot::Owned(LazySlot::new(move || {
                    driver
                        .create_resource(&connection_string)
                        .with_context(|| {
                            format!(
                                "While creating a {} resource for `{}`",
                                D::NAME,
                                connection_string
                            )
                        })
                }))
            }
            (None, None) => {
                return Err(ConnectionError::configuration(
                    "Either a connection string or a resource must be supplied",
                ));
            }
        };
        let result = Self {
            id: Uuid::new_v4(),
            connection_string,
            resource,
            command_timeout,
            open_count: 0,
            opened_internally: false,
            transaction: None,
            enlisted: None,
            sink: sink.unwrap_or_else(|| Arc::new(LogSink)),
            ambient: ambient.unwrap_or_else(|| Arc::new(NoAmbientContext)),
        };
        log::debug!(
            "Created {} connection {} ({})",
            D::NAME,
            result.id,
            if result.owns_resource() {
                "owned resource"
            } else {
                "external resource"
            }
        );
        Ok(result)
    }

    /// Manager owning a resource created lazily from `connection_string`.
    pub fn from_connection_string(
        driver: D,
        connection_string: impl Into<String>,
    ) -> ConnectionResult<Self> {
        Self::new(
            driver,
            ConnectionOptions::new().connection_string(connection_string),
        )
    }

    /// Manager driving a resource that remains the caller's.
    pub fn from_resource(driver: D, resource: D::Resource) -> ConnectionResult<Self> {
        Self::new(driver, ConnectionOptions::new().resource(resource))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string.as_deref()
    }

    pub fn command_timeout(&self) -> Option<i32> {
        self.command_timeout
    }

    pub fn set_command_timeout(&mut self, seconds: Option<i32>) -> ConnectionResult<()> {
        validate_command_timeout(seconds)?;
        self.command_timeout = seconds;
        Ok(())
    }

    /// Number of outstanding opens.
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    /// Whether the physical open was performed by this manager, making it
    /// responsible for the physical close.
    pub fn is_opened_internally(&self) -> bool {
        self.opened_internally
    }

    pub fn owns_resource(&self) -> bool {
        matches!(self.resource, ResourceSlot::Owned(..))
    }

    /// The underlying resource, created first if this manager owns it and it
    /// was not accessed yet.
    pub fn resource(&mut self) -> ConnectionResult<&mut D::Resource> {
        Ok(self.materialize()?)
    }

    /// The underlying resource, only if it already exists.
    pub fn resource_if_created(&self) -> Option<&D::Resource> {
        match &self.resource {
            ResourceSlot::Owned(slot) => slot.get(),
            ResourceSlot::External(resource) => Some(resource),
            ResourceSlot::Detached => None,
        }
    }

    /// Physical state of the resource, `Closed` when it does not exist yet.
    pub fn state(&self) -> ConnectionState {
        self.resource_if_created()
            .map(|v| v.state())
            .unwrap_or_default()
    }

    /// Open the connection, physically if needed.
    ///
    /// Returns `true` when this call performed the physical open. On success
    /// the open count grew by one, on failure it is left untouched and an
    /// error event was emitted.
    pub fn open(&mut self) -> ConnectionResult<bool> {
        if !self.prepare_open(false)? {
            self.open_count += 1;
            return Ok(false);
        }
        let timer = self.notify_start(EventKind::Opening, false);
        let result = self
            .materialize()
            .and_then(|resource| resource.open())
            .map_err(ConnectionError::from);
        self.finish_open(&timer, false, result)
    }

    /// Asynchronous [`open`](Self::open), giving up with
    /// [`ConnectionError::Cancelled`] once `cancellation` is signalled.
    pub async fn open_async(&mut self, cancellation: &CancellationToken) -> ConnectionResult<bool> {
        if !self.prepare_open(true)? {
            self.open_count += 1;
            return Ok(false);
        }
        let timer = self.notify_start(EventKind::Opening, true);
        let result = match self.materialize() {
            Ok(resource) => {
                let cancelled = pin!(cancellation.cancelled());
                let open = pin!(resource.open_async());
                // Cancellation is polled first, an already cancelled token never opens
                match future::select(cancelled, open).await {
                    Either::Left(..) => Err(ConnectionError::Cancelled),
                    Either::Right((result, ..)) => result.map_err(ConnectionError::from),
                }
            }
            Err(e) => Err(e.into()),
        };
        self.finish_open(&timer, true, result)
    }

    /// Release one open.
    ///
    /// The physical close happens only when the count drops to zero and this
    /// manager performed the physical open. Returns `true` when this call
    /// closed the resource. Closing an unopened connection does nothing.
    pub fn close(&mut self) -> ConnectionResult<bool> {
        if !self.prepare_close() {
            return Ok(false);
        }
        let timer = self.notify_start(EventKind::Closing, false);
        let result = self
            .materialize()
            .and_then(|resource| resource.close())
            .map_err(ConnectionError::from);
        self.finish_close(&timer, false, result)
    }

    pub async fn close_async(&mut self) -> ConnectionResult<bool> {
        if !self.prepare_close() {
            return Ok(false);
        }
        let timer = self.notify_start(EventKind::Closing, true);
        let result = match self.materialize() {
            Ok(resource) => resource.close_async().await.map_err(ConnectionError::from),
            Err(e) => Err(e.into()),
        };
        self.finish_close(&timer, true, result)
    }

    /// Dispose the current transaction and, if owned, the resource.
    ///
    /// An owned resource is replaced by a fresh lazily created one and the
    /// open count restarts from zero, the manager stays usable. An external
    /// resource is left untouched.
    pub fn dispose(&mut self) {
        if let Err(e) = self.dispose_transaction() {
            log::error!(
                "Error while disposing the transaction of connection {}: {:#}",
                self.id,
                e
            );
        }
        if let ResourceSlot::Owned(slot) = &mut self.resource {
            if let Some(mut resource) = slot.reset() {
                log::debug!("Disposing the resource of connection {}", self.id);
                resource.dispose();
            }
            self.open_count = 0;
            self.opened_internally = false;
        }
    }

    /// Consume the manager and hand back the resource, if any.
    ///
    /// This is how the owner of an external resource gets it back. The
    /// current transaction, if any, is disposed first.
    pub fn into_resource(mut self) -> Option<D::Resource> {
        if let Err(e) = self.dispose_transaction() {
            log::error!(
                "Error while disposing the transaction of connection {}: {:#}",
                self.id,
                e
            );
        }
        match std::mem::replace(&mut self.resource, ResourceSlot::Detached) {
            ResourceSlot::Owned(mut slot) => slot.reset(),
            ResourceSlot::External(resource) => Some(resource),
            ResourceSlot::Detached => None,
        }
    }

    pub(crate) fn materialize(&mut self) -> Result<&mut D::Resource> {
        match &mut self.resource {
            ResourceSlot::Owned(slot) => slot.force(),
            ResourceSlot::External(resource) => Ok(resource),
            ResourceSlot::Detached => Err(tether_core::Error::msg(format!(
                "The resource of connection {} was detached",
                self.id
            ))),
        }
    }

    /// Returns whether a physical open is needed.
    fn prepare_open(&mut self, is_async: bool) -> ConnectionResult<bool> {
        self.warn_unmanaged_ambient();
        let id = self.id;
        let resource = match self.materialize() {
            Ok(resource) => resource,
            Err(e) => {
                let timer = EventTimer::start();
                return Err(self.report(Operation::Open, &timer, is_async, e.into()));
            }
        };
        if resource.state() == ConnectionState::Broken {
            log::debug!("Connection {} is broken, closing it before opening", id);
            if let Err(e) = resource.close() {
                log::warn!("Could not reset the broken connection {}: {:#}", id, e);
            }
        }
        Ok(!resource.state().is_open())
    }

    fn finish_open(
        &mut self,
        timer: &EventTimer,
        is_async: bool,
        result: ConnectionResult<()>,
    ) -> ConnectionResult<bool> {
        match result {
            Ok(()) => {
                self.notify(EventKind::Opened, timer, true, is_async, None);
                if self.open_count == 0 {
                    self.opened_internally = true;
                }
                self.open_count += 1;
                Ok(true)
            }
            Err(e) => Err(self.report(Operation::Open, timer, is_async, e)),
        }
    }

    /// Returns whether a physical close is needed, otherwise takes care of the
    /// bookkeeping.
    fn prepare_close(&mut self) -> bool {
        if self.open_count == 0 {
            log::debug!(
                "Ignoring close of connection {}, it has no outstanding opens",
                self.id
            );
            return false;
        }
        if self.open_count > 1 || !self.opened_internally {
            self.open_count -= 1;
            return false;
        }
        let needs_close = self.state() != ConnectionState::Closed;
        if !needs_close {
            self.open_count = 0;
            self.opened_internally = false;
        }
        needs_close
    }

    fn finish_close(
        &mut self,
        timer: &EventTimer,
        is_async: bool,
        result: ConnectionResult<()>,
    ) -> ConnectionResult<bool> {
        match result {
            Ok(()) => {
                self.notify(EventKind::Closed, timer, true, is_async, None);
                self.open_count = 0;
                self.opened_internally = false;
                Ok(true)
            }
            Err(e) => Err(self.report(Operation::Close, timer, is_async, e)),
        }
    }

    pub(crate) fn notify_start(&self, kind: EventKind, is_async: bool) -> EventTimer {
        let timer = EventTimer::start();
        self.notify(kind, &timer, false, is_async, None);
        timer
    }

    fn notify(
        &self,
        kind: EventKind,
        timer: &EventTimer,
        finished: bool,
        is_async: bool,
        fault: Option<&ConnectionError>,
    ) {
        let (database, data_source) = self
            .resource_if_created()
            .map(|v| (v.database(), v.data_source()))
            .unwrap_or_default();
        let (end, duration) = if finished {
            let (end, duration) = timer.stop();
            (Some(end), Some(duration))
        } else {
            (None, None)
        };
        self.sink.notify(&ConnectionEvent {
            kind,
            connection_id: self.id,
            instance_id: timer.instance_id,
            database,
            data_source,
            start: timer.start,
            end,
            duration,
            is_async,
            fault,
        });
    }

    /// Emit the error event for `error` and give it back for propagation.
    fn report(
        &self,
        operation: Operation,
        timer: &EventTimer,
        is_async: bool,
        error: ConnectionError,
    ) -> ConnectionError {
        self.notify(EventKind::Error(operation), timer, true, is_async, Some(&error));
        error
    }
}

impl<D: Driver> Drop for ManagedConnection<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}
