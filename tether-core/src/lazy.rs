use crate::Result;
use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

pub type Factory<T> = Arc<dyn Fn() -> Result<T> + Send + Sync>;

/// A value built on first access by a factory, replaceable with a fresh
/// unmaterialized state.
///
/// The factory is kept across resets, a reset never touches the old value
/// beyond handing it back.
pub struct LazySlot<T> {
    value: Option<T>,
    factory: Factory<T>,
}

impl<T> LazySlot<T> {
    pub fn new(factory: impl Fn() -> Result<T> + Send + Sync + 'static) -> Self {
        Self {
            value: None,
            factory: Arc::new(factory),
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.value.is_some()
    }

    /// The value, if it was already built.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// The value, building it first if needed. A failed build leaves the slot
    /// unmaterialized so the next access tries again.
    pub fn force(&mut self) -> Result<&mut T> {
        let value = match self.value.take() {
            Some(v) => v,
            None => (self.factory)()?,
        };
        Ok(self.value.insert(value))
    }

    /// Go back to the unmaterialized state, returning the previous value.
    pub fn reset(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T: Debug> Debug for LazySlot<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => f.debug_tuple("LazySlot").field(v).finish(),
            None => f.write_str("LazySlot(<pending>)"),
        }
    }
}
