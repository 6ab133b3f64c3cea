use uuid::Uuid;

/// Reports the ambient transaction established by the hosting environment.
///
/// Managed connections ask this before every open and warn when an ambient
/// transaction exists that they do not participate in.
pub trait AmbientContext: Send + Sync {
    /// Identifier of the active ambient transaction, if any.
    fn current(&self) -> Option<Uuid>;

    fn is_active(&self) -> bool {
        self.current().is_some()
    }
}

/// For environments without any notion of ambient transactions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAmbientContext;

impl AmbientContext for NoAmbientContext {
    fn current(&self) -> Option<Uuid> {
        None
    }
}
