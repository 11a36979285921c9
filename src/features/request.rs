//! Transport-populated request capability.
use crate::{
    body::Body,
    http::{Method, Version, standard},
    values::ValueMap,
};

/// Request line, headers, and body as extracted by the transport.
///
/// Every field is mutable; derived views (query, cookies, form) re-derive
/// when the raw value they were computed from changes.
#[derive(Debug, Default)]
pub struct RequestHead {
    pub method: Method,
    /// `http` or `https`, lowercase.
    pub scheme: String,
    /// Mount prefix owned by the host, empty at the root.
    pub path_base: String,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: String,
    pub version: Version,
    pub headers: ValueMap,
    pub body: Body,
}

impl RequestHead {
    /// Create [`RequestHead`] for an `http` request at the root path.
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            scheme: standard::HTTP.to_owned(),
            path_base: String::new(),
            path: "/".to_owned(),
            query: String::new(),
            version: Version::default(),
            headers: ValueMap::new(),
            body: Body::empty(),
        }
    }
}
