//! Type-indexed feature registry.
//!
//! A *feature* is a typed capability slot: the transport plugs in what it can
//! do (request line, headers, body), upper layers resolve what they need, and
//! either side can substitute an alternative implementation by setting a
//! different instance for that capability type.
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    hash::{BuildHasherDefault, Hasher},
    sync::Arc,
};

mod cache;

pub mod request;
pub mod response;
pub mod query;
pub mod cookies;
pub mod form;
pub mod lifetime;
pub mod identifier;
pub mod items;
pub mod session;
pub mod auth;
pub mod connection;

pub use cache::FeatureRef;

/// TypeId is already a high quality hash, pass it through.
#[derive(Default)]
struct NoopHasher(u64);

impl Hasher for NoopHasher {
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    fn write(&mut self, _: &[u8]) {
        unreachable!("TypeId calls write_u64");
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

type Map = HashMap<TypeId, Box<dyn Any + Send + Sync>, BuildHasherDefault<NoopHasher>>;

/// Type-indexed feature registry.
///
/// Capability lookup consults the own store first, then the optional
/// read-only `defaults` registry. [`set`][Features::set] always writes the
/// own store, shadowing a defaults entry of the same type.
///
/// Every mutation that changes which instance a lookup observes bumps the
/// [`revision`][Features::revision] counter; caches that remember a feature
/// alongside a revision stay valid exactly while the revision is unchanged.
pub struct Features {
    map: Option<Map>,
    defaults: Option<Arc<Features>>,
    revision: u64,
}

impl Features {
    /// Create new empty [`Features`].
    ///
    /// This function does not allocate.
    pub const fn new() -> Self {
        Self {
            map: None,
            defaults: None,
            revision: 0,
        }
    }

    /// Create new [`Features`] that falls back to `defaults` on miss.
    ///
    /// The defaults registry is never mutated through this one.
    pub const fn with_defaults(defaults: Arc<Features>) -> Self {
        Self {
            map: None,
            defaults: Some(defaults),
            revision: 0,
        }
    }

    /// Returns the mutation counter, including the defaults registry's.
    ///
    /// Strictly increases on every [`set`][Features::set] that changes
    /// presence or replaces an instance; unchanged by no-op removals.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
            + match &self.defaults {
                Some(defaults) => defaults.revision(),
                None => 0,
            }
    }

    /// Returns the number of distinct capability types visible.
    pub fn len(&self) -> usize {
        let own = self.map.as_ref().map(Map::len).unwrap_or_default();
        let inherited = match &self.defaults {
            Some(defaults) => defaults.iter().filter(|(id, _)| !self.shadows(*id)).count(),
            None => 0,
        };
        own + inherited
    }

    /// Returns `true` if no capability is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the feature of the given type.
    ///
    /// Falls back to the defaults registry when the own store misses.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        match self
            .map
            .as_ref()
            .and_then(|map| map.get(&TypeId::of::<T>()))
        {
            Some(value) => value.downcast_ref(),
            None => self
                .defaults
                .as_ref()
                .and_then(|defaults| defaults.get::<T>()),
        }
    }

    /// Returns a mutable reference to the feature of the given type.
    ///
    /// Only the own store is consulted; defaults are read-only.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.map
            .as_mut()
            .and_then(|map| map.get_mut(&TypeId::of::<T>()))
            .and_then(|value| value.downcast_mut())
    }

    /// Returns `true` if the feature of the given type is visible.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.contains_own::<T>()
            || self
                .defaults
                .as_ref()
                .is_some_and(|defaults| defaults.contains::<T>())
    }

    pub(crate) fn contains_own<T: Send + Sync + 'static>(&self) -> bool {
        self.map
            .as_ref()
            .is_some_and(|map| map.contains_key(&TypeId::of::<T>()))
    }

    /// Install a feature, returning the replaced instance if one was present.
    ///
    /// Bumps the revision.
    pub fn set<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.revision += 1;
        self.map
            .get_or_insert_default()
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast().map(|boxed| *boxed).ok())
    }

    /// Remove the feature of the given type from the own store.
    ///
    /// Bumps the revision only when an entry was actually removed.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        let removed = self
            .map
            .as_mut()
            .and_then(|map| map.remove(&TypeId::of::<T>()))
            .and_then(|value| value.downcast().map(|boxed| *boxed).ok());
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Returns an iterator over visible capabilities: own entries first, then
    /// defaults entries not shadowed by an own entry of the same type.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (TypeId, &(dyn Any + Send + Sync))> + '_> {
        let own = self
            .map
            .iter()
            .flat_map(|map| map.iter())
            .map(|(id, value)| (*id, &**value));
        match &self.defaults {
            Some(defaults) => {
                Box::new(own.chain(defaults.iter().filter(|(id, _)| !self.shadows(*id))))
            }
            None => Box::new(own),
        }
    }

    fn shadows(&self, id: TypeId) -> bool {
        self.map.as_ref().is_some_and(|map| map.contains_key(&id))
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Features {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Features")
            .field("length", &self.len())
            .field("revision", &self.revision())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Limit(u32);

    #[derive(Debug, PartialEq)]
    struct Tag(&'static str);

    #[test]
    fn lookup_and_shadowing() {
        let mut defaults = Features::new();
        defaults.set(Limit(8));
        defaults.set(Tag("default"));

        let mut features = Features::with_defaults(Arc::new(defaults));
        assert_eq!(features.get::<Limit>(), Some(&Limit(8)));
        assert_eq!(features.len(), 2);

        // own entry shadows the defaults entry
        features.set(Tag("own"));
        assert_eq!(features.get::<Tag>(), Some(&Tag("own")));
        assert_eq!(features.len(), 2);

        // defaults are read-only through this registry
        assert!(features.get_mut::<Limit>().is_none());
        assert!(features.contains::<Limit>());

        features.remove::<Tag>();
        assert_eq!(features.get::<Tag>(), Some(&Tag("default")));
    }

    #[test]
    fn revision_strictly_increases() {
        let mut features = Features::new();
        let r0 = features.revision();

        features.set(Limit(1));
        let r1 = features.revision();
        assert!(r1 > r0);

        // replacing an existing instance also bumps
        features.set(Limit(2));
        let r2 = features.revision();
        assert!(r2 > r1);

        // removal of a present entry bumps
        features.remove::<Limit>();
        let r3 = features.revision();
        assert!(r3 > r2);

        // no-op removal of an absent entry does not
        features.remove::<Limit>();
        assert_eq!(features.revision(), r3);
    }

    #[test]
    fn revision_proxies_defaults() {
        let defaults = Arc::new({
            let mut d = Features::new();
            d.set(Limit(1));
            d
        });
        let mut features = Features::with_defaults(Arc::clone(&defaults));
        assert_eq!(features.revision(), defaults.revision());

        features.set(Tag("x"));
        assert_eq!(features.revision(), defaults.revision() + 1);
    }

    #[test]
    fn iter_unions_with_shadowing() {
        let mut defaults = Features::new();
        defaults.set(Limit(8));
        defaults.set(Tag("default"));

        let mut features = Features::with_defaults(Arc::new(defaults));
        features.set(Tag("own"));

        let ids = features.iter().map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&TypeId::of::<Tag>()));
        assert!(ids.contains(&TypeId::of::<Limit>()));
        // the shadowed Tag is the own one
        let tag = features
            .iter()
            .find(|(id, _)| *id == TypeId::of::<Tag>())
            .and_then(|(_, any)| any.downcast_ref::<Tag>());
        assert_eq!(tag, Some(&Tag("own")));
    }
}
