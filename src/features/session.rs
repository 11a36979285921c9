//! Session capability contract.
//!
//! This crate never implements session storage; a session middleware
//! satisfies [`Session`] and installs a [`SessionFeature`] before the
//! application touches the context.
use std::fmt;

/// Contract a session backend must satisfy.
pub trait Session: Send + Sync {
    /// Returns the session identifier.
    fn id(&self) -> &str;

    /// Returns `true` when the backing store has been loaded.
    fn is_available(&self) -> bool;

    /// Returns a copy of the value at the key, if present.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a value at the key.
    fn set(&mut self, key: &str, value: Vec<u8>);

    /// Remove the value at the key.
    fn remove(&mut self, key: &str);

    /// Remove every value.
    fn clear(&mut self);
}

/// Holder installing a [`Session`] backend into the feature registry.
pub struct SessionFeature {
    session: Box<dyn Session>,
}

impl SessionFeature {
    /// Create [`SessionFeature`] wrapping the given backend.
    pub fn new(session: Box<dyn Session>) -> Self {
        Self { session }
    }

    /// Returns the session backend.
    #[inline]
    pub fn session(&self) -> &dyn Session {
        &*self.session
    }

    /// Returns the session backend mutably.
    #[inline]
    pub fn session_mut(&mut self) -> &mut dyn Session {
        &mut *self.session
    }

    /// Replace the session backend.
    pub fn set(&mut self, session: Box<dyn Session>) {
        self.session = session;
    }
}

impl fmt::Debug for SessionFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFeature")
            .field("id", &self.session.id())
            .field("available", &self.session.is_available())
            .finish()
    }
}
