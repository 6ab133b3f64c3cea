use crate::lifecycle::connect;
use tether::{
    CancellationToken, ConnectionError, ConnectionState, Driver, EventKind, IsolationLevel,
    Operation,
};

pub async fn asynchronous<D: Driver>(driver: D, connection_string: &str) {
    let (mut connection, sink) = connect(driver, connection_string);
    let cancellation = CancellationToken::new();
    assert!(
        connection
            .open_async(&cancellation)
            .await
            .expect("Async open failed")
    );
    assert!(
        !connection
            .open_async(&cancellation)
            .await
            .expect("Second async open failed")
    );
    assert_eq!(connection.open_count(), 2);

    #[cfg(not(feature = "disable-transactions"))]
    {
        let transaction = connection
            .begin_transaction_async(IsolationLevel::Snapshot, &cancellation)
            .await
            .expect("Could not begin a transaction asynchronously");
        assert_eq!(transaction.isolation_level(), IsolationLevel::Snapshot);
        assert_eq!(connection.open_count(), 3);
        connection
            .commit_transaction_async()
            .await
            .expect("Could not commit asynchronously");
        assert_eq!(connection.open_count(), 2);
    }

    assert!(!connection.close_async().await.expect("Async close failed"));
    assert!(connection.close_async().await.expect("Async close failed"));
    assert_eq!(connection.state(), ConnectionState::Closed);
    let events = sink.events();
    assert_eq!(sink.count(EventKind::Opened), 1);
    assert_eq!(sink.count(EventKind::Closed), 1);
    assert!(events.iter().all(|v| v.is_async));

    sink.clear();
    let cancellation = CancellationToken::new();
    let canceller = cancellation.clone();
    tokio::spawn(async move { canceller.cancel() })
        .await
        .expect("The cancelling task panicked");
    assert!(matches!(
        connection.open_async(&cancellation).await,
        Err(ConnectionError::Cancelled)
    ));
    assert_eq!(connection.open_count(), 0);
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert_eq!(
        sink.kinds(),
        [EventKind::Opening, EventKind::Error(Operation::Open)]
    );
    assert!(sink.errors().iter().all(|v| v.cancelled));
}
