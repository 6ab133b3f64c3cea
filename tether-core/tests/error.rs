#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use tether_core::{
        ConnectionError, ConnectionState, Context, Error, EventKind, EventTimer, IsolationLevel,
        Operation,
    };

    #[test]
    fn resource_fault_is_unchanged() {
        let fault = Error::msg("socket reset").context("While opening `test`");
        let error = ConnectionError::from(fault);
        assert_eq!(format!("{}", error), "While opening `test`");
        assert_eq!(format!("{:#}", error), "While opening `test`: socket reset");
        assert_eq!(
            error.fault().map(|v| v.root_cause().to_string()),
            Some("socket reset".to_string())
        );
        assert!(!error.is_cancelled());
    }

    #[test]
    fn context_on_results() {
        let result: tether_core::Result<()> =
            Err(Error::msg("refused")).context("While connecting");
        let error = ConnectionError::from(result.unwrap_err());
        assert!(format!("{:#}", error).ends_with("refused"));
        assert!(error.source().is_some());
    }

    #[test]
    fn kinds() {
        assert!(ConnectionError::Cancelled.is_cancelled());
        assert!(ConnectionError::Cancelled.fault().is_none());
        assert_eq!(
            ConnectionError::invalid_operation("no transaction").to_string(),
            "Invalid operation: no transaction"
        );
        assert_eq!(
            ConnectionError::configuration("negative timeout").to_string(),
            "Invalid configuration: negative timeout"
        );
    }

    #[test]
    fn timer_is_monotonic() {
        let timer = EventTimer::start();
        let (end, elapsed) = timer.stop();
        assert!(end >= timer.start);
        assert_eq!(end - timer.start, elapsed);
        assert_ne!(EventTimer::start().instance_id, timer.instance_id);
    }

    #[test]
    fn display() {
        assert_eq!(IsolationLevel::Serializable.to_string(), "SERIALIZABLE");
        assert_eq!(IsolationLevel::ReadCommitted.to_string(), "READ COMMITTED");
        assert_eq!(IsolationLevel::default(), IsolationLevel::Unspecified);
        assert_eq!(ConnectionState::default(), ConnectionState::Closed);
        assert_eq!(ConnectionState::Broken.to_string(), "broken");
        assert_eq!(Operation::Close.to_string(), "close");
        assert!(EventKind::Opening.is_starting());
        assert!(EventKind::BeginTransaction(IsolationLevel::Snapshot).is_starting());
        assert!(!EventKind::Error(Operation::Open).is_starting());
    }
}
