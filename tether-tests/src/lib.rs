mod asynchronous;
mod capture;
mod lifecycle;
mod recording;
mod transactions;

pub use capture::*;
pub use recording::*;

#[cfg(not(feature = "disable-async"))]
use asynchronous::asynchronous;
use lifecycle::{dispose_round_trip, nested_opens, unbalanced_close};
use log::LevelFilter;
use std::env;
use tether::Driver;
#[cfg(not(feature = "disable-transactions"))]
use transactions::{begin_opens, release_keeps_native, single_transaction};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the lifecycle suite against connections created from
/// `connection_string`, the resources must start closed.
pub async fn execute_tests<D: Driver + Clone>(driver: D, connection_string: &str) {
    nested_opens(driver.clone(), connection_string);
    unbalanced_close(driver.clone(), connection_string);
    dispose_round_trip(driver.clone(), connection_string);
    #[cfg(not(feature = "disable-transactions"))]
    {
        begin_opens(driver.clone(), connection_string);
        single_transaction(driver.clone(), connection_string);
        release_keeps_native(driver.clone(), connection_string);
    }
    #[cfg(not(feature = "disable-async"))]
    asynchronous(driver.clone(), connection_string).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
