use crate::{Resource, Result};

/// Creates resources from connection strings.
///
/// A driver is the factory side of a backend: the manager keeps it around so
/// that an owned resource can be recreated after disposal.
pub trait Driver: Send + Sync + 'static {
    type Resource: Resource;

    const NAME: &'static str;

    /// Build a new, closed resource for `connection_string`.
    ///
    /// This must not perform any I/O, the physical open happens later through
    /// [`Resource::open`] or [`Resource::open_async`].
    fn create_resource(&self, connection_string: &str) -> Result<Self::Resource>;
}
