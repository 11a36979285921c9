//! Authentication capability contract.
//!
//! Only the principal-holding contract lives here; credential validation is
//! an external collaborator that sets the resolved principal before the
//! application reads it.
use crate::values::ValueMap;

/// The authenticated party of a request.
///
/// An anonymous principal has no name and no claims.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Principal {
    name: Option<String>,
    claims: ValueMap,
}

impl Principal {
    /// Create an unauthenticated [`Principal`].
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Create an authenticated [`Principal`] with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            claims: ValueMap::new(),
        }
    }

    /// Returns the principal name, when authenticated.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` when a party has been authenticated.
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.name.is_some()
    }

    /// Returns the claim set.
    #[inline]
    pub fn claims(&self) -> &ValueMap {
        &self.claims
    }

    /// Add one claim.
    pub fn add_claim(&mut self, kind: impl Into<String>, value: impl Into<String>) {
        self.claims.append(kind, value);
    }
}

/// Holder installing the current [`Principal`] into the feature registry.
#[derive(Debug, Default)]
pub struct AuthFeature {
    user: Option<Principal>,
}

impl AuthFeature {
    /// Create [`AuthFeature`] with no principal resolved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolved principal, if any.
    #[inline]
    pub fn user(&self) -> Option<&Principal> {
        self.user.as_ref()
    }

    /// Replace the resolved principal.
    pub fn set_user(&mut self, user: Principal) {
        self.user = Some(user);
    }

    pub(crate) fn user_slot(&mut self) -> &mut Option<Principal> {
        &mut self.user
    }
}
