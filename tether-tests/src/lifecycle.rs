use crate::RecordingSink;
use tether::{ConnectionOptions, ConnectionState, Driver, EventKind, ManagedConnection};

pub(crate) fn connect<D: Driver>(
    driver: D,
    connection_string: &str,
) -> (ManagedConnection<D>, RecordingSink) {
    let sink = RecordingSink::new();
    let connection = ManagedConnection::new(
        driver,
        ConnectionOptions::new()
            .connection_string(connection_string)
            .sink(sink.clone()),
    )
    .expect("Could not create the connection");
    (connection, sink)
}

pub fn nested_opens<D: Driver>(driver: D, connection_string: &str) {
    let (mut connection, sink) = connect(driver, connection_string);
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(connection.open().expect("First open failed"));
    assert!(!connection.open().expect("Second open failed"));
    assert_eq!(connection.open_count(), 2);
    assert!(connection.is_opened_internally());
    assert_eq!(connection.state(), ConnectionState::Open);

    assert!(!connection.close().expect("First close failed"));
    assert_eq!(
        connection.state(),
        ConnectionState::Open,
        "The connection must stay open while an open is outstanding"
    );
    assert!(connection.close().expect("Second close failed"));
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert_eq!(connection.open_count(), 0);
    assert!(!connection.is_opened_internally());

    assert_eq!(
        sink.kinds(),
        [
            EventKind::Opening,
            EventKind::Opened,
            EventKind::Closing,
            EventKind::Closed
        ]
    );
    let events = sink.events();
    assert_eq!(events[0].instance_id, events[1].instance_id);
    assert_eq!(events[2].instance_id, events[3].instance_id);
    assert_ne!(events[0].instance_id, events[2].instance_id);
    for event in &events {
        assert_eq!(event.connection_id, connection.id());
        assert!(!event.is_async);
        assert!(event.fault.is_none());
    }
    for pair in events.chunks(2) {
        assert!(pair[0].end.is_none());
        let end = pair[1].end.expect("Finished events carry an end timestamp");
        assert!(end >= pair[1].start);
        assert_eq!(pair[0].start, pair[1].start);
    }
}

pub fn unbalanced_close<D: Driver>(driver: D, connection_string: &str) {
    let (mut connection, sink) = connect(driver, connection_string);
    assert!(!connection.close().expect("Close of an unopened connection failed"));
    assert_eq!(connection.open_count(), 0);
    connection.open().expect("Open failed");
    connection.close().expect("Close failed");
    assert!(!connection.close().expect("Extra close failed"));
    assert_eq!(connection.open_count(), 0);
    assert_eq!(sink.count(EventKind::Closing), 1);
}

pub fn dispose_round_trip<D: Driver>(driver: D, connection_string: &str) {
    let (mut connection, sink) = connect(driver, connection_string);
    connection.open().expect("Open failed");
    connection.open().expect("Open failed");
    connection.dispose();
    assert_eq!(connection.open_count(), 0);
    assert!(connection.resource_if_created().is_none());
    assert_eq!(connection.state(), ConnectionState::Closed);

    sink.clear();
    assert!(connection.open().expect("Open after dispose failed"));
    assert_eq!(connection.open_count(), 1);
    assert_eq!(connection.state(), ConnectionState::Open);
    assert!(connection.close().expect("Close after dispose failed"));
    assert_eq!(sink.count(EventKind::Opened), 1);
    assert_eq!(sink.count(EventKind::Closed), 1);
}
