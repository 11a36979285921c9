//! Context facade over the feature registry.
//!
//! A [`HttpContext`] exclusively owns one [`Features`] registry for the
//! duration of a request. [`Request`] and [`Response`] are borrow-scoped
//! views that lazily resolve capabilities through revision-checked memo
//! cells, so derived state persists across accesses and dies with
//! re-initialization.
use crate::{
    features::{
        FeatureRef, Features,
        auth::{AuthFeature, Principal},
        connection::ConnectionInfo,
        cookies::RequestCookiesFeature,
        form::FormFeature,
        identifier::RequestId,
        items::Items,
        lifetime::{CancelSignal, Lifetime},
        query::QueryFeature,
        request::RequestHead,
        response::ResponseHead,
        session::{Session, SessionFeature},
    },
    form::FormOptions,
};

mod error;
mod pool;
mod request;
mod response;

#[cfg(test)]
mod test;

pub use error::{ContextError, ContextErrorKind};
pub use pool::ContextFactory;
pub use request::Request;
pub use response::Response;

// ===== States =====

/// Memo cells backing the request view.
#[derive(Debug, Default)]
pub(crate) struct RequestState {
    pub(crate) head: FeatureRef<RequestHead>,
    pub(crate) query: FeatureRef<QueryFeature>,
    pub(crate) cookies: FeatureRef<RequestCookiesFeature>,
    pub(crate) form: FeatureRef<FormFeature>,
}

impl RequestState {
    fn reset(&mut self) {
        self.head.reset();
        self.query.reset();
        self.cookies.reset();
        self.form.reset();
    }
}

/// Memo cells backing the response view.
#[derive(Debug, Default)]
pub(crate) struct ResponseState {
    pub(crate) head: FeatureRef<ResponseHead>,
}

impl ResponseState {
    fn reset(&mut self) {
        self.head.reset();
    }
}

/// Memo cells for context-level capabilities.
#[derive(Debug, Default)]
struct ContextCache {
    items: FeatureRef<Items>,
    lifetime: FeatureRef<Lifetime>,
    identifier: FeatureRef<RequestId>,
    session: FeatureRef<SessionFeature>,
    auth: FeatureRef<AuthFeature>,
    connection: FeatureRef<ConnectionInfo>,
}

impl ContextCache {
    fn reset(&mut self) {
        self.items.reset();
        self.lifetime.reset();
        self.identifier.reset();
        self.session.reset();
        self.auth.reset();
        self.connection.reset();
    }
}

// ===== HttpContext =====

/// Per-request facade over one feature registry.
///
/// A context serves exactly one logical request at a time; nothing here is
/// internally synchronized except the lifetime cancellation signal, which
/// may be triggered from anywhere.
#[derive(Debug)]
pub struct HttpContext {
    features: Features,
    options: FormOptions,
    bound: bool,
    request: RequestState,
    response: ResponseState,
    cache: ContextCache,
}

impl HttpContext {
    /// Create [`HttpContext`] over a fresh registry with default request and
    /// response capabilities installed.
    pub fn new() -> Self {
        let mut features = Features::new();
        features.set(RequestHead::new());
        features.set(ResponseHead::new());
        Self::with_features(features)
    }

    /// Create [`HttpContext`] over a transport-populated registry.
    ///
    /// Missing request/response capabilities are installed with defaults on
    /// first access.
    pub fn with_features(features: Features) -> Self {
        Self {
            features,
            options: FormOptions::default(),
            bound: false,
            request: RequestState::default(),
            response: ResponseState::default(),
            cache: ContextCache::default(),
        }
    }

    /// Override the form reading limits.
    pub fn with_form_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// Rebind this context to a new registry, discarding every derived
    /// cache of the previous request.
    pub fn initialize(&mut self, features: Features) {
        self.features = features;
        self.bound = false;
        self.request.reset();
        self.response.reset();
        self.cache.reset();
    }

    /// Detach from the current request: the registry is dropped and every
    /// per-request handle is cleared.
    ///
    /// Idempotent; a detached context observes only empty data until it is
    /// initialized again.
    pub fn uninitialize(&mut self) {
        self.features = Features::new();
        self.bound = false;
        self.request.reset();
        self.response.reset();
        self.cache.reset();
    }

    /// Returns the feature registry.
    #[inline]
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Returns the feature registry mutably, for capability substitution.
    #[inline]
    pub fn features_mut(&mut self) -> &mut Features {
        &mut self.features
    }

    /// Request and response views bind together on the first access to
    /// either, so both start from the same registry revision.
    fn bind(&mut self) {
        if !self.bound {
            self.request.reset();
            self.response.reset();
            self.bound = true;
        }
    }

    /// Returns the request view.
    pub fn request(&mut self) -> Request<'_> {
        self.bind();
        Request::new(&mut self.features, &mut self.request, &self.options)
    }

    /// Returns the response view.
    pub fn response(&mut self) -> Response<'_> {
        self.bind();
        Response::new(&mut self.features, &mut self.response)
    }

    /// Returns the transport connection info, lazily bound on first access.
    pub fn connection(&mut self) -> &mut ConnectionInfo {
        self.cache
            .connection
            .fetch_or_insert(&mut self.features, |_| ConnectionInfo::new())
    }

    /// Returns the request-scoped property bag.
    pub fn items(&mut self) -> &mut Items {
        self.cache
            .items
            .fetch_or_insert(&mut self.features, |_| Items::new())
    }

    /// Returns the cancellation signal observed by request processing.
    pub fn aborted(&mut self) -> CancelSignal {
        self.cache
            .lifetime
            .fetch_or_insert(&mut self.features, |_| Lifetime::new())
            .aborted()
    }

    /// Trigger the lifetime signal: the request should stop processing.
    ///
    /// Does not change the context state.
    pub fn abort(&mut self) {
        self.cache
            .lifetime
            .fetch_or_insert(&mut self.features, |_| Lifetime::new())
            .abort();
    }

    /// Returns the trace identifier, generating one on first access.
    pub fn trace_identifier(&mut self) -> &str {
        self.cache
            .identifier
            .fetch_or_insert(&mut self.features, |_| RequestId::new())
            .get_or_generate()
    }

    /// Replace the trace identifier.
    pub fn set_trace_identifier(&mut self, id: impl Into<String>) {
        self.cache
            .identifier
            .fetch_or_insert(&mut self.features, |_| RequestId::new())
            .set(id);
    }

    /// Returns the current principal, anonymous until authentication
    /// resolves one.
    pub fn user(&mut self) -> &Principal {
        self.cache
            .auth
            .fetch_or_insert(&mut self.features, |_| AuthFeature::new())
            .user_slot()
            .get_or_insert_with(Principal::anonymous)
    }

    /// Replace the current principal.
    pub fn set_user(&mut self, user: Principal) {
        self.cache
            .auth
            .fetch_or_insert(&mut self.features, |_| AuthFeature::new())
            .set_user(user);
    }

    /// Returns the session.
    ///
    /// # Errors
    ///
    /// Returns error when no session capability has been configured; this is
    /// a host configuration error, not an empty session.
    pub fn session(&mut self) -> Result<&mut dyn Session, ContextError> {
        match self.cache.session.fetch(&mut self.features) {
            Some(feature) => Ok(feature.session_mut()),
            None => Err(ContextErrorKind::SessionNotConfigured.into()),
        }
    }

    /// Install or replace the session backend.
    pub fn set_session(&mut self, session: Box<dyn Session>) {
        match self.cache.session.fetch(&mut self.features) {
            Some(feature) => feature.set(session),
            None => {
                self.features.set(SessionFeature::new(session));
            }
        }
    }
}
