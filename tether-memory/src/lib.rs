mod driver;
mod probe;
mod resource;
mod transaction;

pub use driver::*;
pub use probe::*;
pub use resource::*;
pub use transaction::*;
