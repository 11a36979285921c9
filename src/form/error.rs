use std::{fmt, io};

/// Error from form content negotiation, decoding, or limits.
#[derive(Debug)]
pub struct FormError {
    kind: FormErrorKind,
}

#[derive(Debug)]
pub enum FormErrorKind {
    /// Form access on a request whose content type is not a form media type.
    ContentType,
    /// More form values than `value_count_limit`.
    ValueCountLimit(usize),
    /// A key longer than `key_length_limit`.
    KeyLengthLimit(usize),
    /// A value longer than `value_length_limit`.
    ValueLengthLimit(usize),
    /// A multipart body larger than `multipart_body_length_limit`.
    BodyLengthLimit(u64),
    /// Structurally invalid multipart payload.
    Multipart(&'static str),
    /// The request lifetime signal was triggered mid-read.
    Cancelled,
    /// Transport failure while reading the body.
    Io(io::Error),
}

use FormErrorKind as Kind;

impl FormError {
    /// Returns the error kind.
    pub fn kind(&self) -> &FormErrorKind {
        &self.kind
    }

    /// Returns `true` when the read stopped on the cancellation signal, as
    /// opposed to an I/O failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, Kind::Cancelled)
    }
}

impl From<Kind> for FormError {
    fn from(kind: Kind) -> Self {
        Self { kind }
    }
}

impl From<io::Error> for FormError {
    fn from(err: io::Error) -> Self {
        Self {
            kind: Kind::Io(err),
        }
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            Kind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl fmt::Display for FormErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::ContentType => f.write_str("request content type is not a form media type"),
            Kind::ValueCountLimit(limit) => write!(f, "form value count limit {limit} exceeded"),
            Kind::KeyLengthLimit(limit) => write!(f, "form key length limit {limit} exceeded"),
            Kind::ValueLengthLimit(limit) => write!(f, "form value length limit {limit} exceeded"),
            Kind::BodyLengthLimit(limit) => write!(f, "multipart body length limit {limit} exceeded"),
            Kind::Multipart(reason) => write!(f, "malformed multipart body: {reason}"),
            Kind::Cancelled => f.write_str("form read cancelled"),
            Kind::Io(err) => write!(f, "body read error: {err}"),
        }
    }
}
