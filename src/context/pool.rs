//! Context recycling across requests.
use std::sync::Mutex;

use crate::{features::Features, form::FormOptions, log::debug};

use super::HttpContext;

/// Creates contexts for incoming requests, recycling disposed ones.
///
/// The free list is the only shared structure; access to it is mutually
/// exclusive, and a popped context is owned by exactly one request until it
/// is disposed back.
#[derive(Debug, Default)]
pub struct ContextFactory {
    pool: Mutex<Vec<HttpContext>>,
    options: FormOptions,
}

impl ContextFactory {
    /// Create [`ContextFactory`] with default form limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create [`ContextFactory`] with the given form limits, applied to
    /// every created context.
    pub fn with_options(options: FormOptions) -> Self {
        Self {
            pool: Mutex::new(Vec::new()),
            options,
        }
    }

    /// Create a context over the transport-populated registry, reusing a
    /// pooled instance when one is free.
    ///
    /// A reused instance is reinitialized against the new registry; no state
    /// of its previous request survives.
    pub fn create(&self, features: Features) -> HttpContext {
        match self.lock().pop() {
            Some(mut context) => {
                debug!("reinitializing pooled context");
                context.initialize(features);
                context
            }
            None => {
                HttpContext::with_features(features).with_form_options(self.options.clone())
            }
        }
    }

    /// Detach the context from its request and return it to the pool.
    pub fn dispose(&self, mut context: HttpContext) {
        context.uninitialize();
        self.lock().push(context);
    }

    /// Returns the number of free contexts.
    pub fn pooled(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HttpContext>> {
        match self.pool.lock() {
            Ok(guard) => guard,
            // a context is never left mid-mutation inside the list
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
