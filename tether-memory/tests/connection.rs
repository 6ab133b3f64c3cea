#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tether::{
        CancellationToken, ConnectionError, ConnectionOptions, ConnectionState, Driver,
        EventKind, ManagedConnection, Operation, Resource,
    };
    use tether_memory::MemoryDriver;
    use tether_tests::{RecordingSink, init_logs, silent_logs};

    fn connect(driver: &MemoryDriver) -> (ManagedConnection<MemoryDriver>, RecordingSink) {
        let sink = RecordingSink::new();
        let connection = ManagedConnection::new(
            driver.clone(),
            ConnectionOptions::new()
                .connection_string("db=test;host=localhost")
                .sink(sink.clone()),
        )
        .expect("Could not create the connection");
        (connection, sink)
    }

    #[test]
    fn lazy_resource() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, _sink) = connect(&driver);
        assert_eq!(connection.connection_string(), Some("db=test;host=localhost"));
        assert!(connection.owns_resource());
        assert_eq!(driver.probe().created(), 0);
        assert!(connection.resource_if_created().is_none());
        let resource = connection.resource().expect("Could not create the resource");
        assert_eq!(resource.database(), "test");
        assert_eq!(resource.data_source(), "localhost");
        assert_eq!(resource.state(), ConnectionState::Closed);
        connection.resource().expect("Could not access the resource");
        assert_eq!(driver.probe().created(), 1);
    }

    #[test]
    fn open_twice_close_twice() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, sink) = connect(&driver);
        connection.open().expect("Open failed");
        connection.open().expect("Open failed");
        connection.close().expect("Close failed");
        connection.close().expect("Close failed");
        assert_eq!(driver.probe().opens(), 1);
        assert_eq!(driver.probe().closes(), 1);
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert_eq!(
            sink.kinds(),
            [
                EventKind::Opening,
                EventKind::Opened,
                EventKind::Closing,
                EventKind::Closed
            ]
        );
        for event in sink.events() {
            assert_eq!(event.database, "test");
            assert_eq!(event.data_source, "localhost");
        }
    }

    #[test]
    fn external_open_resource_is_never_closed() {
        init_logs();
        let driver = MemoryDriver::new();
        let mut resource = driver
            .create_resource("db=external")
            .expect("Could not create the resource");
        resource.open().expect("Could not open the resource");
        let sink = RecordingSink::new();
        let mut connection = ManagedConnection::new(
            driver.clone(),
            ConnectionOptions::new()
                .resource(resource)
                .sink(sink.clone()),
        )
        .expect("Could not create the connection");
        assert!(!connection.owns_resource());
        assert_eq!(connection.connection_string(), None);

        assert!(!connection.open().expect("Open failed"));
        assert!(!connection.is_opened_internally());
        assert!(!connection.close().expect("Close failed"));
        assert_eq!(connection.state(), ConnectionState::Open);
        assert!(sink.events().is_empty());

        connection.dispose();
        assert_eq!(driver.probe().disposed(), 0);
        let resource = connection
            .into_resource()
            .expect("The external resource must be handed back");
        assert_eq!(resource.state(), ConnectionState::Open);
        assert_eq!(driver.probe().closes(), 0);
        assert_eq!(driver.probe().disposed(), 0);
    }

    #[test]
    fn external_closed_resource_is_closed_by_the_manager() {
        init_logs();
        let driver = MemoryDriver::new();
        let resource = driver
            .create_resource("db=external")
            .expect("Could not create the resource");
        let mut connection = ManagedConnection::from_resource(driver.clone(), resource)
            .expect("Could not create the connection");
        assert!(connection.open().expect("Open failed"));
        assert!(connection.is_opened_internally());
        assert!(connection.close().expect("Close failed"));
        assert_eq!(connection.state(), ConnectionState::Closed);
        drop(connection);
        assert_eq!(driver.probe().disposed(), 0);
    }

    #[test]
    fn failed_open_leaves_count() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, sink) = connect(&driver);
        driver.probe().fail_next_open();
        let result;
        silent_logs! {
            result = connection.open();
        }
        let fault = match result {
            Err(ConnectionError::Resource(fault)) => fault,
            other => panic!("Expected a resource error, got {:?}", other),
        };
        assert!(format!("{:#}", fault).contains("Injected failure while opening"));
        assert_eq!(connection.open_count(), 0);
        assert!(!connection.is_opened_internally());
        assert_eq!(sink.kinds(), [EventKind::Opening, EventKind::Error(Operation::Open)]);
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].fault.is_some());
        assert!(errors[0].end.is_some());
        assert_eq!(errors[0].instance_id, sink.events()[0].instance_id);

        assert!(connection.open().expect("Open after a failure failed"));
        assert_eq!(connection.open_count(), 1);
    }

    #[test]
    fn failed_open_with_outstanding_opens() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, _sink) = connect(&driver);
        connection.open().expect("Open failed");
        connection
            .resource()
            .expect("Could not access the resource")
            .break_link();
        driver.probe().fail_next_open();
        silent_logs! {
            assert!(connection.open().is_err());
        }
        assert_eq!(connection.open_count(), 1);
        assert_eq!(connection.state(), ConnectionState::Closed);
    }

    #[test]
    fn failed_resource_creation() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, sink) = connect(&driver);
        driver.probe().fail_next_create();
        silent_logs! {
            assert!(matches!(connection.open(), Err(ConnectionError::Resource(..))));
        }
        assert_eq!(sink.kinds(), [EventKind::Error(Operation::Open)]);
        assert!(connection.resource_if_created().is_none());
        assert!(connection.open().expect("Open after a failed creation failed"));
    }

    #[test]
    fn malformed_connection_string() {
        init_logs();
        let driver = MemoryDriver::new();
        let mut connection = ManagedConnection::from_connection_string(driver, "db=test;oops")
            .expect("The connection string is only interpreted by the driver");
        silent_logs! {
            assert!(connection.open().is_err());
        }
        assert_eq!(connection.open_count(), 0);
    }

    #[test]
    fn failed_close_leaves_count() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, sink) = connect(&driver);
        connection.open().expect("Open failed");
        driver.probe().fail_next_close();
        silent_logs! {
            assert!(matches!(connection.close(), Err(ConnectionError::Resource(..))));
        }
        assert_eq!(connection.open_count(), 1);
        assert!(connection.is_opened_internally());
        assert_eq!(connection.state(), ConnectionState::Open);
        assert_eq!(sink.count(EventKind::Error(Operation::Close)), 1);

        assert!(connection.close().expect("Retrying the close failed"));
        assert_eq!(connection.open_count(), 0);
        assert_eq!(connection.state(), ConnectionState::Closed);
    }

    #[test]
    fn broken_resource_is_reset() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, sink) = connect(&driver);
        connection.open().expect("Open failed");
        connection
            .resource()
            .expect("Could not access the resource")
            .break_link();
        assert_eq!(connection.state(), ConnectionState::Broken);
        assert!(connection.open().expect("Open of a broken connection failed"));
        assert_eq!(connection.state(), ConnectionState::Open);
        assert_eq!(connection.open_count(), 2);
        assert_eq!(driver.probe().opens(), 2);
        assert_eq!(sink.count(EventKind::Opened), 2);

        connection.close().expect("Close failed");
        assert!(connection.close().expect("Close failed"));
        assert_eq!(connection.state(), ConnectionState::Closed);
    }

    #[test]
    fn dispose_recreates_owned_resource() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, _sink) = connect(&driver);
        connection.open().expect("Open failed");
        connection.dispose();
        assert_eq!(driver.probe().disposed(), 1);
        assert_eq!(driver.probe().closes(), 1);
        assert_eq!(connection.open_count(), 0);
        assert!(connection.open().expect("Open after dispose failed"));
        assert_eq!(connection.open_count(), 1);
        assert_eq!(driver.probe().created(), 2);
        drop(connection);
        assert_eq!(driver.probe().disposed(), 2);
        assert_eq!(driver.probe().opens(), driver.probe().closes());
    }

    #[test]
    fn configuration_errors() {
        init_logs();
        let driver = MemoryDriver::new();
        let neither;
        let both;
        let negative;
        let resource = driver
            .create_resource("db=test")
            .expect("Could not create the resource");
        silent_logs! {
            neither = ManagedConnection::new(driver.clone(), ConnectionOptions::new());
            both = ManagedConnection::new(
                driver.clone(),
                ConnectionOptions::new()
                    .connection_string("db=test")
                    .resource(resource),
            );
            negative = ManagedConnection::new(
                driver.clone(),
                ConnectionOptions::new()
                    .connection_string("db=test")
                    .command_timeout(-1),
            );
        }
        assert!(matches!(neither, Err(ConnectionError::Configuration(..))));
        assert!(matches!(both, Err(ConnectionError::Configuration(..))));
        assert!(matches!(negative, Err(ConnectionError::Configuration(..))));
    }

    #[test]
    fn command_timeout() {
        init_logs();
        let mut connection = ManagedConnection::new(
            MemoryDriver::new(),
            ConnectionOptions::new()
                .connection_string("db=test")
                .command_timeout(30),
        )
        .expect("Could not create the connection");
        assert_eq!(connection.command_timeout(), Some(30));
        silent_logs! {
            assert!(matches!(
                connection.set_command_timeout(Some(-1)),
                Err(ConnectionError::Configuration(..))
            ));
        }
        assert_eq!(connection.command_timeout(), Some(30));
        connection
            .set_command_timeout(None)
            .expect("Could not unset the timeout");
        assert_eq!(connection.command_timeout(), None);
        connection
            .set_command_timeout(Some(0))
            .expect("Could not set a zero timeout");
        assert_eq!(connection.command_timeout(), Some(0));
    }

    #[tokio::test]
    async fn cancelled_before_open() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, sink) = connect(&driver);
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let result = connection.open_async(&cancellation).await;
        assert!(matches!(result, Err(ConnectionError::Cancelled)));
        assert_eq!(connection.open_count(), 0);
        assert_eq!(driver.probe().opens(), 0);
        assert_eq!(sink.kinds(), [EventKind::Opening, EventKind::Error(Operation::Open)]);
        let errors = sink.errors();
        assert!(errors[0].cancelled);
        assert!(errors[0].is_async);
    }

    #[tokio::test]
    async fn cancelled_while_opening() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, sink) = connect(&driver);
        driver.probe().stall_opens(true);
        let cancellation = CancellationToken::new();
        let canceller = {
            let cancellation = cancellation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancellation.cancel();
            })
        };
        let result = connection.open_async(&cancellation).await;
        canceller.await.expect("The canceller task panicked");
        assert!(result.is_err_and(|e| e.is_cancelled()));
        assert_eq!(connection.open_count(), 0);
        assert_eq!(sink.count(EventKind::Opened), 0);
        assert_eq!(sink.count(EventKind::Error(Operation::Open)), 1);

        driver.probe().stall_opens(false);
        assert!(
            connection
                .open_async(&CancellationToken::new())
                .await
                .expect("Async open after a cancellation failed")
        );
        assert_eq!(connection.open_count(), 1);
    }

    #[tokio::test]
    async fn failed_async_open() {
        init_logs();
        let driver = MemoryDriver::new();
        let (mut connection, sink) = connect(&driver);
        driver.probe().fail_next_open();
        let result;
        silent_logs! {
            result = connection.open_async(&CancellationToken::new()).await;
        }
        assert!(matches!(result, Err(ConnectionError::Resource(..))));
        assert_eq!(connection.open_count(), 0);
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert!(!errors[0].cancelled);
        assert!(errors[0].is_async);
    }
}
