mod ambient;
mod cancellation;
mod driver;
mod error;
mod event;
mod lazy;
mod resource;
mod sink;
mod state;
mod transaction;

pub use ::anyhow::Context;
pub use ambient::*;
pub use cancellation::*;
pub use driver::*;
pub use error::*;
pub use event::*;
pub use lazy::*;
pub use resource::*;
pub use sink::*;
pub use state::*;
pub use transaction::*;
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
