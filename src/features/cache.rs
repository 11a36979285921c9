//! Revision-checked feature memo cell.
use std::marker::PhantomData;

use super::Features;

/// Memo cell for one capability type, validated against the registry
/// revision.
///
/// The cell remembers the revision it last resolved against. While the
/// revision is unchanged the resolved state is trusted; once it advances the
/// cell re-resolves, so an externally substituted instance is picked up and a
/// removed one is reinstalled from the factory. A context that rebinds to a
/// different registry must [`reset`][FeatureRef::reset] its cells.
pub struct FeatureRef<T> {
    revision: Option<u64>,
    present: bool,
    _p: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> FeatureRef<T> {
    /// Create an unresolved cell.
    pub const fn new() -> Self {
        Self {
            revision: None,
            present: false,
            _p: PhantomData,
        }
    }

    /// Forget everything resolved so far.
    pub fn reset(&mut self) {
        self.revision = None;
        self.present = false;
    }

    /// Resolve the capability without installing anything.
    ///
    /// Returns [`None`] when the registry's own store has no instance.
    pub fn fetch<'a>(&mut self, features: &'a mut Features) -> Option<&'a mut T> {
        let revision = features.revision();
        if self.revision != Some(revision) {
            self.present = features.contains_own::<T>();
            self.revision = Some(revision);
        }
        if self.present {
            features.get_mut::<T>()
        } else {
            None
        }
    }

    /// Resolve the capability, installing a `init`-built instance into the
    /// registry when absent so every later lookup observes the same one.
    pub fn fetch_or_insert<'a, F>(&mut self, features: &'a mut Features, init: F) -> &'a mut T
    where
        F: FnOnce(&Features) -> T,
    {
        let revision = features.revision();
        if self.revision != Some(revision) || !self.present {
            if !features.contains_own::<T>() {
                let value = init(&*features);
                features.set(value);
            }
            self.present = true;
            self.revision = Some(features.revision());
        }
        match features.get_mut::<T>() {
            Some(value) => value,
            // the branch above guarantees an own-store entry
            None => unreachable!("feature resolved above"),
        }
    }
}

impl<T: Send + Sync + 'static> Default for FeatureRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for FeatureRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureRef")
            .field("revision", &self.revision)
            .field("present", &self.present)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    #[test]
    fn installs_default_once() {
        let mut features = Features::new();
        let mut cell = FeatureRef::<Counter>::new();

        let value = cell.fetch_or_insert(&mut features, |_| Counter(1));
        value.0 += 1;

        // second resolve observes the registry-resident instance
        let value = cell.fetch_or_insert(&mut features, |_| Counter(100));
        assert_eq!(value.0, 2);
        assert_eq!(features.get::<Counter>(), Some(&Counter(2)));
    }

    #[test]
    fn self_heals_after_external_replace() {
        let mut features = Features::new();
        let mut cell = FeatureRef::<Counter>::new();

        cell.fetch_or_insert(&mut features, |_| Counter(1));
        features.set(Counter(7));

        let value = cell.fetch_or_insert(&mut features, |_| Counter(100));
        assert_eq!(value.0, 7);
    }

    #[test]
    fn reinstalls_after_external_remove() {
        let mut features = Features::new();
        let mut cell = FeatureRef::<Counter>::new();

        cell.fetch_or_insert(&mut features, |_| Counter(1));
        features.remove::<Counter>();

        let value = cell.fetch_or_insert(&mut features, |_| Counter(9));
        assert_eq!(value.0, 9);
    }

    #[test]
    fn fetch_does_not_install() {
        let mut features = Features::new();
        let mut cell = FeatureRef::<Counter>::new();

        assert!(cell.fetch(&mut features).is_none());
        assert!(!features.contains::<Counter>());

        features.set(Counter(3));
        assert_eq!(cell.fetch(&mut features).map(|c| c.0), Some(3));
    }
}
