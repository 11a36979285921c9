use std::fmt;

use crate::features::response::ResponseStarted;

/// Error from using the context facade outside its supported configuration.
#[derive(Debug)]
pub struct ContextError {
    kind: ContextErrorKind,
}

#[derive(Debug)]
pub enum ContextErrorKind {
    /// Session access without a configured session capability.
    ///
    /// A configuration error in the host application, distinct from a
    /// session with no data.
    SessionNotConfigured,
    /// Head mutation after the response has started.
    ResponseStarted,
}

use ContextErrorKind as Kind;

impl ContextError {
    /// Returns the error kind.
    pub fn kind(&self) -> &ContextErrorKind {
        &self.kind
    }
}

impl From<Kind> for ContextError {
    fn from(kind: Kind) -> Self {
        Self { kind }
    }
}

impl From<ResponseStarted> for ContextError {
    fn from(_: ResponseStarted) -> Self {
        Self {
            kind: Kind::ResponseStarted,
        }
    }
}

impl std::error::Error for ContextError {}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl fmt::Display for ContextErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::SessionNotConfigured => {
                f.write_str("session has not been configured for this application or request")
            }
            Kind::ResponseStarted => f.write_str("response has already started"),
        }
    }
}
