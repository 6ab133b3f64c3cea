use crate::{ConnectionState, IsolationLevel, Result, ResourceTransaction};
use std::future::{self, Future};

/// A physical connection to a data store.
///
/// The manager only ever drives a resource through this trait: it reads the
/// state, opens, closes, disposes and starts transactions. How the bytes
/// travel is entirely up to the implementation.
///
/// # Sync and async paths
/// Every physical action has a blocking and a suspending variant. The async
/// variants default to the blocking ones, drivers with real non-blocking I/O
/// should override them.
pub trait Resource: Send {
    type Transaction: ResourceTransaction;

    fn state(&self) -> ConnectionState;

    /// Name of the database this resource targets, used in instrumentation.
    fn database(&self) -> &str;

    /// Host (or data source) this resource targets, used in instrumentation.
    fn data_source(&self) -> &str;

    fn open(&mut self) -> Result<()>;

    fn open_async(&mut self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.open())
    }

    fn close(&mut self) -> Result<()>;

    fn close_async(&mut self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.close())
    }

    fn begin_transaction(&mut self, isolation_level: IsolationLevel)
    -> Result<Self::Transaction>;

    fn begin_transaction_async(
        &mut self,
        isolation_level: IsolationLevel,
    ) -> impl Future<Output = Result<Self::Transaction>> + Send {
        future::ready(self.begin_transaction(isolation_level))
    }

    /// Release every native resource held, closing the connection if needed.
    ///
    /// Called at most once by the manager, and only on resources it owns.
    fn dispose(&mut self) {
        if self.state() != ConnectionState::Closed
            && let Err(e) = self.close()
        {
            log::warn!("Error while closing a resource during dispose: {:#}", e);
        }
    }
}
