#[cfg(test)]
mod tests {
    use tether_memory::MemoryDriver;
    use tether_tests::{execute_tests, init_logs};

    #[tokio::test]
    async fn memory() {
        init_logs();
        let driver = MemoryDriver::new();
        execute_tests(driver.clone(), "db=suite;host=localhost").await;
        let probe = driver.probe();
        assert_eq!(
            probe.opens(),
            probe.closes(),
            "Every physical open performed by the suite must be balanced by a close"
        );
    }
}
