use crate::MemoryProbe;
use std::sync::{Arc, atomic::Ordering};
use tether_core::{Error, IsolationLevel, ResourceTransaction, Result};

#[derive(Debug)]
pub struct MemoryTransaction {
    isolation_level: IsolationLevel,
    finished: bool,
    probe: Arc<MemoryProbe>,
}

impl MemoryTransaction {
    pub fn new(isolation_level: IsolationLevel, probe: Arc<MemoryProbe>) -> Self {
        Self {
            isolation_level,
            finished: false,
            probe,
        }
    }

    /// Whether it was committed or rolled back.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.finished {
            return Err(Error::msg("The transaction was already completed"));
        }
        Ok(())
    }
}

impl ResourceTransaction for MemoryTransaction {
    fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    fn commit(&mut self) -> Result<()> {
        self.ensure_pending()?;
        if self.probe.take_failure(&self.probe.fail_commit) {
            return Err(Error::msg("Injected failure while committing"));
        }
        self.probe.commits.fetch_add(1, Ordering::Relaxed);
        self.finished = true;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.ensure_pending()?;
        self.probe.rollbacks.fetch_add(1, Ordering::Relaxed);
        self.finished = true;
        Ok(())
    }

    /// Rolls back implicitly when still pending.
    fn dispose(&mut self) {
        if !self.finished {
            self.probe.rollbacks.fetch_add(1, Ordering::Relaxed);
            self.finished = true;
        }
        self.probe.transactions_disposed.fetch_add(1, Ordering::Relaxed);
    }
}
