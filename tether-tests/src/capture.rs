use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::{LazyLock, Mutex};

static CAPTURE: LazyLock<LogCapture> = LazyLock::new(LogCapture::default);

/// Logger keeping every formatted record in memory.
///
/// It is process wide: a test binary using it must not call [`init_logs`](crate::init_logs).
#[derive(Debug, Default)]
pub struct LogCapture {
    records: Mutex<Vec<(Level, String)>>,
}

/// Install the capturing logger (once per process) and return it.
pub fn capture_logs() -> &'static LogCapture {
    let capture: &'static LogCapture = &CAPTURE;
    if log::set_logger(capture).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
    capture
}

impl LogCapture {
    /// Messages logged at `level` containing `needle`.
    pub fn records(&self, level: Level, needle: &str) -> Vec<String> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records
            .iter()
            .filter(|(l, message)| *l == level && message.contains(needle))
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl Log for LogCapture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}
