use crate::{IsolationLevel, Result};
use std::future::{self, Future};

/// A native transaction started by a [`Resource`](crate::Resource).
pub trait ResourceTransaction: Send {
    fn isolation_level(&self) -> IsolationLevel;

    fn commit(&mut self) -> Result<()>;

    fn commit_async(&mut self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.commit())
    }

    fn rollback(&mut self) -> Result<()>;

    fn rollback_async(&mut self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.rollback())
    }

    /// Release the native transaction.
    ///
    /// Disposing a transaction that was neither committed nor rolled back is
    /// expected to roll it back, that is the resource's business.
    fn dispose(&mut self) {}
}
