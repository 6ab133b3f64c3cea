mod ambient;
mod config;
mod connection;
mod log_sink;
mod transaction;

pub use ambient::*;
pub use config::*;
pub use connection::*;
pub use log_sink::*;
pub use tether_core::*;
pub use transaction::*;
