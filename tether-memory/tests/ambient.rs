#[cfg(test)]
mod tests {
    use log::Level;
    use tether::{
        AmbientScope, CancellationToken, ConnectionOptions, ManagedConnection,
        ThreadAmbientContext,
    };
    use tether_memory::MemoryDriver;
    use tether_tests::capture_logs;

    fn connect() -> ManagedConnection<MemoryDriver> {
        ManagedConnection::new(
            MemoryDriver::new(),
            ConnectionOptions::new()
                .connection_string("db=test")
                .ambient(ThreadAmbientContext),
        )
        .expect("Could not create the connection")
    }

    #[test]
    fn unmanaged_ambient_does_not_block() {
        capture_logs();
        let mut connection = connect();
        assert!(!connection.has_unmanaged_ambient());
        let scope = AmbientScope::new();
        assert!(connection.has_unmanaged_ambient());
        assert!(connection.open().expect("Open inside an ambient scope failed"));
        assert_eq!(connection.open_count(), 1);
        drop(scope);
        assert!(!connection.has_unmanaged_ambient());
        connection.close().expect("Close failed");
    }

    #[test]
    fn enlisted_ambient() {
        capture_logs();
        let mut connection = connect();
        let scope = AmbientScope::new();
        connection.enlist(Some(scope.id()));
        assert_eq!(connection.enlisted(), Some(scope.id()));
        assert!(!connection.has_unmanaged_ambient());
        {
            let _inner = AmbientScope::new();
            assert!(connection.has_unmanaged_ambient());
        }
        connection.enlist(None);
        assert!(connection.has_unmanaged_ambient());
    }

    #[test]
    fn default_has_no_ambient() {
        capture_logs();
        let connection = ManagedConnection::from_connection_string(MemoryDriver::new(), "db=test")
            .expect("Could not create the connection");
        let _scope = AmbientScope::new();
        assert!(!connection.has_unmanaged_ambient());
    }

    #[test]
    fn unmanaged_ambient_warns_on_open() {
        let logs = capture_logs();
        let mut connection = connect();
        let id = connection.id().to_string();
        connection.open().expect("Open failed");
        connection.close().expect("Close failed");
        assert!(logs.records(Level::Warn, &id).is_empty());

        let scope = AmbientScope::new();
        connection.open().expect("Open inside an ambient scope failed");
        let warnings = logs.records(Level::Warn, &id);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains(&scope.id().to_string()));

        connection.enlist(Some(scope.id()));
        connection.open().expect("Nested open failed");
        assert_eq!(logs.records(Level::Warn, &id).len(), 1);
        connection.close().expect("Close failed");
        connection.close().expect("Close failed");
    }

    #[tokio::test]
    async fn unmanaged_ambient_warns_on_async_open() {
        let logs = capture_logs();
        let mut connection = connect();
        let id = connection.id().to_string();
        let cancellation = CancellationToken::new();
        let _scope = AmbientScope::new();
        connection
            .open_async(&cancellation)
            .await
            .expect("Async open inside an ambient scope failed");
        assert_eq!(logs.records(Level::Warn, &id).len(), 1);
        connection.close_async().await.expect("Close failed");
    }
}
