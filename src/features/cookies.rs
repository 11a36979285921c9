//! Request and response cookie capabilities.
use crate::{
    cookie::{CookieOptions, format_expired_cookie, format_set_cookie},
    http::standard::SET_COOKIE,
    values::{ValueMap, Values},
};

/// Parsed request cookies, cached against the `Cookie` header lines they
/// were computed from.
///
/// Reparsing overwrites the whole mapping, it never merges into an earlier
/// parse.
#[derive(Debug, Default)]
pub struct RequestCookiesFeature {
    original: Option<Values>,
    parsed: Option<ValueMap>,
}

impl RequestCookiesFeature {
    /// Create [`RequestCookiesFeature`] that derives from the `Cookie`
    /// header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the cached mapping no longer matches the header
    /// value.
    pub(crate) fn is_stale(&self, raw: &Values) -> bool {
        self.parsed.is_none() || self.original.as_ref() != Some(raw)
    }

    /// Cache `cookies` as the parse of the `raw` header lines.
    pub(crate) fn store(&mut self, raw: Values, cookies: ValueMap) {
        self.original = Some(raw);
        self.parsed = Some(cookies);
    }

    pub(crate) fn cookies_mut(&mut self) -> &mut Option<ValueMap> {
        &mut self.parsed
    }
}

// ===== ResponseCookies =====

/// Write access to the `Set-Cookie` response headers.
///
/// Every append formats one complete `Set-Cookie` value; cookies are never
/// merged into a single header line.
#[derive(Debug)]
pub struct ResponseCookies<'a> {
    headers: &'a mut ValueMap,
}

impl<'a> ResponseCookies<'a> {
    pub(crate) fn new(headers: &'a mut ValueMap) -> Self {
        Self { headers }
    }

    /// Append a `Set-Cookie` header with default attributes.
    pub fn append(&mut self, name: &str, value: &str) {
        self.append_with(name, value, &CookieOptions::default());
    }

    /// Append a `Set-Cookie` header with the given attributes.
    pub fn append_with(&mut self, name: &str, value: &str, options: &CookieOptions) {
        self.headers
            .append(SET_COOKIE, format_set_cookie(name, value, options));
    }

    /// Append an expired `Set-Cookie` header deleting the cookie.
    pub fn delete(&mut self, name: &str) {
        self.delete_with(name, &CookieOptions::default());
    }

    /// Append an expired `Set-Cookie` header deleting the cookie scoped by
    /// the given path/domain attributes.
    pub fn delete_with(&mut self, name: &str, options: &CookieOptions) {
        self.headers
            .append(SET_COOKIE, format_expired_cookie(name, options));
    }
}
