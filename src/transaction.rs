use crate::ManagedConnection;
use std::fmt::{self, Debug, Formatter};
use tether_core::{
    CancellationToken, ConnectionError, ConnectionResult, Driver, EventKind, IsolationLevel,
    Resource, ResourceTransaction,
};
use uuid::Uuid;

pub type TransactionOf<D> = <<D as Driver>::Resource as Resource>::Transaction;

/// The current transaction of a [`ManagedConnection`].
///
/// Owned transactions were started by the connection and are disposed by it,
/// external ones were adopted through
/// [`use_transaction`](ManagedConnection::use_transaction) and are never
/// disposed here.
#[derive(Debug)]
pub struct ManagedTransaction<T: ResourceTransaction> {
    id: Uuid,
    native: T,
    owned: bool,
}

impl<T: ResourceTransaction> ManagedTransaction<T> {
    pub(crate) fn new(native: T, owned: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            native,
            owned,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.native.isolation_level()
    }

    pub fn native(&self) -> &T {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut T {
        &mut self.native
    }

    pub fn into_native(self) -> T {
        self.native
    }

    fn dispose(mut self) {
        if self.owned {
            self.native.dispose();
        }
    }
}

/// A native transaction [`use_transaction`](ManagedConnection::use_transaction)
/// refused, handed back to the caller together with the reason.
#[derive(thiserror::Error)]
#[error("{error}")]
pub struct RejectedTransaction<T> {
    pub error: ConnectionError,
    pub native: T,
}

impl<T> RejectedTransaction<T> {
    pub fn into_native(self) -> T {
        self.native
    }
}

impl<T> Debug for RejectedTransaction<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RejectedTransaction")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> From<RejectedTransaction<T>> for ConnectionError {
    fn from(value: RejectedTransaction<T>) -> Self {
        value.error
    }
}

impl<D: Driver> ManagedConnection<D> {
    pub fn current_transaction(&self) -> Option<&ManagedTransaction<TransactionOf<D>>> {
        self.transaction.as_ref()
    }

    pub fn current_transaction_mut(&mut self) -> Option<&mut ManagedTransaction<TransactionOf<D>>> {
        self.transaction.as_mut()
    }

    /// Open the connection and start a transaction owned by it.
    ///
    /// The transaction keeps the connection open until it is committed, rolled
    /// back, disposed or released.
    pub fn begin_transaction(
        &mut self,
        isolation_level: IsolationLevel,
    ) -> ConnectionResult<&mut ManagedTransaction<TransactionOf<D>>> {
        self.ensure_no_transaction()?;
        self.open()?;
        self.notify_start(EventKind::BeginTransaction(isolation_level), false);
        let result = self
            .materialize()
            .and_then(|resource| resource.begin_transaction(isolation_level));
        match result {
            Ok(native) => Ok(self.adopt(native, true)),
            Err(e) => {
                let e = ConnectionError::from(e);
                log::error!("{:#}", e);
                if let Err(e) = self.close() {
                    log::error!("Could not release the connection after a failed begin: {:#}", e);
                }
                Err(e)
            }
        }
    }

    pub async fn begin_transaction_async(
        &mut self,
        isolation_level: IsolationLevel,
        cancellation: &CancellationToken,
    ) -> ConnectionResult<&mut ManagedTransaction<TransactionOf<D>>> {
        self.ensure_no_transaction()?;
        self.open_async(cancellation).await?;
        self.notify_start(EventKind::BeginTransaction(isolation_level), true);
        let result = match self.materialize() {
            Ok(resource) => resource.begin_transaction_async(isolation_level).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(native) => Ok(self.adopt(native, true)),
            Err(e) => {
                let e = ConnectionError::from(e);
                log::error!("{:#}", e);
                if let Err(e) = self.close_async().await {
                    log::error!("Could not release the connection after a failed begin: {:#}", e);
                }
                Err(e)
            }
        }
    }

    /// Adopt a transaction started outside of this manager.
    ///
    /// The connection is opened first, the transaction will never be disposed
    /// by the manager. On failure the transaction is returned untouched inside
    /// the [`RejectedTransaction`].
    pub fn use_transaction(
        &mut self,
        native: TransactionOf<D>,
    ) -> Result<&mut ManagedTransaction<TransactionOf<D>>, RejectedTransaction<TransactionOf<D>>>
    {
        let checked = self.ensure_no_transaction().and_then(|_| self.open());
        if let Err(error) = checked {
            return Err(RejectedTransaction { error, native });
        }
        Ok(self.adopt(native, false))
    }

    /// Forget the current transaction without committing, rolling back or
    /// disposing it, handing it back to the caller.
    ///
    /// Returns `None` when there was no transaction. If releasing the open held
    /// by the transaction fails, the transaction stays current.
    pub fn release_transaction(&mut self) -> ConnectionResult<Option<TransactionOf<D>>> {
        let Some(transaction) = self.transaction.take() else {
            return Ok(None);
        };
        log::debug!(
            "Releasing transaction {} of connection {}",
            transaction.id(),
            self.id()
        );
        if let Err(e) = self.close() {
            self.transaction = Some(transaction);
            return Err(e);
        }
        Ok(Some(transaction.into_native()))
    }

    /// Commit and dispose the current transaction.
    ///
    /// An error after the native commit succeeded comes from releasing the
    /// connection: the work is committed and the transaction is already
    /// cleared, only the open it held is still counted.
    pub fn commit_transaction(&mut self) -> ConnectionResult<()> {
        let transaction = self.transaction_for("commit")?;
        log::debug!("Committing transaction {}", transaction.id());
        transaction.native.commit().map_err(|e| {
            let e = ConnectionError::from(e);
            log::error!("{:#}", e);
            e
        })?;
        self.dispose_transaction()
    }

    pub async fn commit_transaction_async(&mut self) -> ConnectionResult<()> {
        let transaction = self.transaction_for("commit")?;
        log::debug!("Committing transaction {}", transaction.id());
        transaction.native.commit_async().await.map_err(|e| {
            let e = ConnectionError::from(e);
            log::error!("{:#}", e);
            e
        })?;
        self.dispose_transaction_async().await
    }

    pub fn rollback_transaction(&mut self) -> ConnectionResult<()> {
        let transaction = self.transaction_for("rollback")?;
        log::debug!("Rolling back transaction {}", transaction.id());
        transaction.native.rollback().map_err(|e| {
            let e = ConnectionError::from(e);
            log::error!("{:#}", e);
            e
        })?;
        self.dispose_transaction()
    }

    pub async fn rollback_transaction_async(&mut self) -> ConnectionResult<()> {
        let transaction = self.transaction_for("rollback")?;
        log::debug!("Rolling back transaction {}", transaction.id());
        transaction.native.rollback_async().await.map_err(|e| {
            let e = ConnectionError::from(e);
            log::error!("{:#}", e);
            e
        })?;
        self.dispose_transaction_async().await
    }

    /// Clear the current transaction, disposing it if owned, and release the
    /// open it holds. Does nothing without a transaction.
    pub fn dispose_transaction(&mut self) -> ConnectionResult<()> {
        if let Some(transaction) = self.transaction.take() {
            transaction.dispose();
            self.close()?;
        }
        Ok(())
    }

    pub async fn dispose_transaction_async(&mut self) -> ConnectionResult<()> {
        if let Some(transaction) = self.transaction.take() {
            transaction.dispose();
            self.close_async().await?;
        }
        Ok(())
    }

    fn adopt(
        &mut self,
        native: TransactionOf<D>,
        owned: bool,
    ) -> &mut ManagedTransaction<TransactionOf<D>> {
        let transaction = ManagedTransaction::new(native, owned);
        log::debug!(
            "Connection {} is now in {} transaction {} ({})",
            self.id(),
            if owned { "owned" } else { "external" },
            transaction.id(),
            transaction.isolation_level()
        );
        self.transaction.insert(transaction)
    }

    fn ensure_no_transaction(&self) -> ConnectionResult<()> {
        match &self.transaction {
            Some(transaction) => {
                let error = ConnectionError::invalid_operation(format!(
                    "Connection {} is already in transaction {}, only one transaction can be active at a time",
                    self.id(),
                    transaction.id()
                ));
                log::error!("{:#}", error);
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn transaction_for(
        &mut self,
        action: &str,
    ) -> ConnectionResult<&mut ManagedTransaction<TransactionOf<D>>> {
        let id = self.id();
        self.transaction.as_mut().ok_or_else(|| {
            let error = ConnectionError::invalid_operation(format!(
                "Cannot {} on connection {}, no transaction is in progress",
                action, id
            ));
            log::error!("{:#}", error);
            error
        })
    }
}
