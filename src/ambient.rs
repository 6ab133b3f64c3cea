use crate::ManagedConnection;
use std::{cell::RefCell, marker::PhantomData};
use tether_core::{AmbientContext, Driver};
use uuid::Uuid;

thread_local! {
    static SCOPES: RefCell<Vec<Uuid>> = const { RefCell::new(Vec::new()) };
}

/// Ambient context backed by the [`AmbientScope`]s alive on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadAmbientContext;

impl AmbientContext for ThreadAmbientContext {
    fn current(&self) -> Option<Uuid> {
        SCOPES.with_borrow(|scopes| scopes.last().copied())
    }
}

/// Establishes an ambient transaction on the current thread until dropped.
///
/// Scopes nest, the innermost one is the current ambient transaction.
#[derive(Debug)]
pub struct AmbientScope {
    id: Uuid,
    _thread_bound: PhantomData<*const ()>,
}

impl AmbientScope {
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        SCOPES.with_borrow_mut(|scopes| scopes.push(id));
        Self {
            id,
            _thread_bound: PhantomData,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for AmbientScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AmbientScope {
    fn drop(&mut self) {
        SCOPES.with_borrow_mut(|scopes| {
            if let Some(i) = scopes.iter().rposition(|v| *v == self.id) {
                scopes.remove(i);
            }
        });
    }
}

impl<D: Driver> ManagedConnection<D> {
    /// Declare that this connection takes part in the ambient transaction `id`
    /// (or in none), silencing the warning for it.
    pub fn enlist(&mut self, id: Option<Uuid>) {
        self.enlisted = id;
    }

    pub fn enlisted(&self) -> Option<Uuid> {
        self.enlisted
    }

    /// Whether an ambient transaction is active that this connection does not
    /// take part in.
    pub fn has_unmanaged_ambient(&self) -> bool {
        self.ambient
            .current()
            .is_some_and(|ambient| self.enlisted != Some(ambient))
    }

    pub(crate) fn warn_unmanaged_ambient(&self) {
        if self.has_unmanaged_ambient()
            && let Some(ambient) = self.ambient.current()
        {
            log::warn!(
                "Connection {} is being opened inside the ambient transaction {} which it does not take part in, \
                its work will not be part of that transaction",
                self.id(),
                ambient
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AmbientScope, ThreadAmbientContext};
    use tether_core::AmbientContext;

    #[test]
    fn scopes_nest() {
        let context = ThreadAmbientContext;
        assert_eq!(context.current(), None);
        let outer = AmbientScope::new();
        assert_eq!(context.current(), Some(outer.id()));
        {
            let inner = AmbientScope::new();
            assert_eq!(context.current(), Some(inner.id()));
            assert!(context.is_active());
        }
        assert_eq!(context.current(), Some(outer.id()));
        drop(outer);
        assert!(!context.is_active());
    }

    #[test]
    fn scopes_are_per_thread() {
        let _scope = AmbientScope::new();
        let other = std::thread::spawn(|| ThreadAmbientContext.current())
            .join()
            .expect("The thread panicked");
        assert_eq!(other, None);
        assert!(ThreadAmbientContext.is_active());
    }
}
