//! Local store - the owned value the reconcilers read and replace.
//!
//! The store holds the current local value and a list of listeners that
//! observe every replacement. Listeners are how persistence or a UI binding
//! hears about changes; the store itself has no opinion on either.

use crate::error::Result;
use std::fmt;

/// Callback invoked after every [`LocalState::replace`].
pub type Listener<T> = Box<dyn FnMut(&T) -> Result<()> + Send>;

/// An owned local value with replace notification.
pub struct LocalState<T> {
    value: T,
    listeners: Vec<Listener<T>>,
}

impl<T> LocalState<T> {
    /// Create a store holding `value` with no listeners.
    pub fn new(value: T) -> Self {
        Self {
            value,
            listeners: Vec::new(),
        }
    }

    /// Register a listener, builder style.
    pub fn with_listener<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&T) -> Result<()> + Send + 'static,
    {
        self.subscribe(listener);
        self
    }

    /// Register a listener.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&T) -> Result<()> + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// The current value.
    pub fn current(&self) -> &T {
        &self.value
    }

    /// Overwrite the value and notify listeners in registration order.
    ///
    /// The value is replaced even if a listener fails; the first listener
    /// error is returned and later listeners are skipped.
    pub fn replace(&mut self, value: T) -> Result<()> {
        self.value = value;
        for listener in &mut self.listeners {
            listener(&self.value)?;
        }
        Ok(())
    }

    /// Overwrite the value without notifying listeners.
    pub fn restore(&mut self, value: T) {
        self.value = value;
    }

    /// Consume the store, returning the value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Default> Default for LocalState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalState")
            .field("value", &self.value)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
