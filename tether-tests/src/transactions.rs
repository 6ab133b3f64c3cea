use crate::lifecycle::connect;
use tether::{ConnectionError, ConnectionState, Driver, EventKind, IsolationLevel};

pub fn begin_opens<D: Driver>(driver: D, connection_string: &str) {
    let (mut connection, sink) = connect(driver, connection_string);
    let transaction = connection
        .begin_transaction(IsolationLevel::Serializable)
        .expect("Could not begin a transaction");
    assert_eq!(transaction.isolation_level(), IsolationLevel::Serializable);
    assert!(transaction.is_owned());
    assert_eq!(connection.state(), ConnectionState::Open);
    assert_eq!(connection.open_count(), 1);
    assert_eq!(
        sink.kinds(),
        [
            EventKind::Opening,
            EventKind::Opened,
            EventKind::BeginTransaction(IsolationLevel::Serializable)
        ]
    );

    connection
        .commit_transaction()
        .expect("Could not commit the transaction");
    assert!(connection.current_transaction().is_none());
    assert_eq!(connection.open_count(), 0);
    assert_eq!(
        connection.state(),
        ConnectionState::Closed,
        "Completing the transaction releases the open it took"
    );
}

pub fn single_transaction<D: Driver>(driver: D, connection_string: &str) {
    let (mut connection, _sink) = connect(driver, connection_string);
    assert!(matches!(
        connection.commit_transaction(),
        Err(ConnectionError::InvalidOperation(..))
    ));
    assert!(matches!(
        connection.rollback_transaction(),
        Err(ConnectionError::InvalidOperation(..))
    ));

    connection.open().expect("Open failed");
    let id = connection
        .begin_transaction(IsolationLevel::ReadCommitted)
        .expect("Could not begin a transaction")
        .id();
    assert_eq!(connection.open_count(), 2);
    assert!(matches!(
        connection.begin_transaction(IsolationLevel::Serializable),
        Err(ConnectionError::InvalidOperation(..))
    ));
    let current = connection
        .current_transaction()
        .expect("The first transaction must still be current");
    assert_eq!(current.id(), id);
    assert_eq!(current.isolation_level(), IsolationLevel::ReadCommitted);
    assert_eq!(connection.open_count(), 2);

    connection
        .rollback_transaction()
        .expect("Could not rollback the transaction");
    assert!(connection.current_transaction().is_none());
    assert_eq!(connection.open_count(), 1);
    assert_eq!(connection.state(), ConnectionState::Open);

    connection
        .begin_transaction(IsolationLevel::Unspecified)
        .expect("Could not begin a transaction after the rollback");
    connection
        .dispose_transaction()
        .expect("Could not dispose the transaction");
    assert!(connection.current_transaction().is_none());
    connection.close().expect("Close failed");
    assert_eq!(connection.state(), ConnectionState::Closed);
}

pub fn release_keeps_native<D: Driver>(driver: D, connection_string: &str) {
    let (mut connection, _sink) = connect(driver, connection_string);
    assert!(
        connection
            .release_transaction()
            .expect("Releasing nothing failed")
            .is_none()
    );
    connection
        .begin_transaction(IsolationLevel::RepeatableRead)
        .expect("Could not begin a transaction");
    let native = connection
        .release_transaction()
        .expect("Could not release the transaction")
        .expect("The released transaction must be handed back");
    assert!(connection.current_transaction().is_none());

    connection.open().expect("Open failed");
    let adopted = connection
        .use_transaction(native)
        .expect("Could not adopt the transaction");
    assert!(!adopted.is_owned());
    assert_eq!(adopted.isolation_level(), IsolationLevel::RepeatableRead);
    assert_eq!(connection.open_count(), 2);
    connection
        .commit_transaction()
        .expect("Could not commit the adopted transaction");
    assert_eq!(connection.open_count(), 1);
    connection.close().expect("Close failed");
    assert_eq!(connection.state(), ConnectionState::Closed);
}
