use crate::{MemoryProbe, MemoryTransaction};
use std::sync::{Arc, atomic::Ordering};
use tether_core::{ConnectionState, Error, IsolationLevel, Resource, Result, future};

#[derive(Debug)]
pub struct MemoryResource {
    state: ConnectionState,
    database: String,
    data_source: String,
    probe: Arc<MemoryProbe>,
}

impl MemoryResource {
    pub fn new(database: String, data_source: String, probe: Arc<MemoryProbe>) -> Self {
        Self {
            state: ConnectionState::Closed,
            database,
            data_source,
            probe,
        }
    }

    /// Simulates a dropped link, the resource reports `Broken` until closed.
    pub fn break_link(&mut self) {
        self.state = ConnectionState::Broken;
    }
}

impl Resource for MemoryResource {
    type Transaction = MemoryTransaction;

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn data_source(&self) -> &str {
        &self.data_source
    }

    fn open(&mut self) -> Result<()> {
        if self.state == ConnectionState::Open {
            return Err(Error::msg(format!(
                "The connection to `{}` is already open",
                self.database
            )));
        }
        if self.probe.take_failure(&self.probe.fail_open) {
            self.state = ConnectionState::Closed;
            return Err(Error::msg(format!(
                "Injected failure while opening `{}`",
                self.database
            )));
        }
        self.probe.opens.fetch_add(1, Ordering::Relaxed);
        self.state = ConnectionState::Open;
        Ok(())
    }

    async fn open_async(&mut self) -> Result<()> {
        if self.probe.stall_open.load(Ordering::Relaxed) {
            future::pending::<()>().await;
        }
        self.open()
    }

    fn close(&mut self) -> Result<()> {
        if self.probe.take_failure(&self.probe.fail_close) {
            return Err(Error::msg(format!(
                "Injected failure while closing `{}`",
                self.database
            )));
        }
        if self.state != ConnectionState::Closed {
            self.probe.closes.fetch_add(1, Ordering::Relaxed);
            self.state = ConnectionState::Closed;
        }
        Ok(())
    }

    fn begin_transaction(&mut self, isolation_level: IsolationLevel) -> Result<MemoryTransaction> {
        if self.state != ConnectionState::Open {
            return Err(Error::msg(format!(
                "Cannot begin a transaction, the connection to `{}` is {}",
                self.database, self.state
            )));
        }
        if self.probe.take_failure(&self.probe.fail_begin) {
            return Err(Error::msg("Injected failure while beginning a transaction"));
        }
        self.probe.begins.fetch_add(1, Ordering::Relaxed);
        Ok(MemoryTransaction::new(isolation_level, self.probe.clone()))
    }

    fn dispose(&mut self) {
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Closed;
            self.probe.closes.fetch_add(1, Ordering::Relaxed);
        }
        self.probe.disposed.fetch_add(1, Ordering::Relaxed);
    }
}
