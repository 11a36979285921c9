//! Form bodies: options, collections, and the streaming pair reader.
use bytes::Bytes;

use crate::{body::Body, values::{ValueMap, Values}};

mod accumulator;
mod error;
mod reader;
mod multipart;

pub(crate) mod decode;

pub use accumulator::Accumulator;
pub use error::{FormError, FormErrorKind};
pub use reader::{BodyFormReader, FormReader, Pair};
pub(crate) use multipart::parse_multipart;

// ===== FormOptions =====

/// Limits applied while reading a form body.
///
/// Every limit is independently overridable; the defaults are safe for
/// untrusted input.
#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Maximum number of accumulated form values.
    pub value_count_limit: usize,
    /// Maximum encoded length of one key.
    pub key_length_limit: usize,
    /// Maximum encoded length of one value.
    pub value_length_limit: usize,
    /// Maximum multipart body size in bytes.
    pub multipart_body_length_limit: u64,
    /// Refill buffer size for the streaming reader.
    pub buffer_size: usize,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            value_count_limit: 1024,
            key_length_limit: 1024 * 2,
            value_length_limit: 1024 * 1024 * 4,
            multipart_body_length_limit: 1024 * 1024 * 128,
            buffer_size: 1024,
        }
    }
}

// ===== FormCollection =====

/// Parsed form body: the field mapping plus uploaded file parts in wire
/// order.
#[derive(Debug, Clone, Default)]
pub struct FormCollection {
    fields: ValueMap,
    files: Vec<FormFile>,
}

impl FormCollection {
    /// Create [`FormCollection`] with fields only.
    pub fn new(fields: ValueMap) -> Self {
        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// Create [`FormCollection`] with fields and file parts.
    pub fn with_files(fields: ValueMap, files: Vec<FormFile>) -> Self {
        Self { fields, files }
    }

    /// Returns the field mapping.
    #[inline]
    pub fn fields(&self) -> &ValueMap {
        &self.fields
    }

    /// Returns the values for the given field, or the empty sentinel.
    #[inline]
    pub fn value(&self, key: &str) -> &Values {
        self.fields.value(key)
    }

    /// Returns the uploaded file parts in wire order.
    #[inline]
    pub fn files(&self) -> &[FormFile] {
        &self.files
    }

    /// Returns the first file part with the given field name, if any.
    pub fn file(&self, name: &str) -> Option<&FormFile> {
        self.files
            .iter()
            .find(|file| file.name().eq_ignore_ascii_case(name))
    }
}

// ===== FormFile =====

/// One uploaded file part of a multipart form.
#[derive(Debug, Clone)]
pub struct FormFile {
    name: String,
    filename: String,
    headers: ValueMap,
    content: Bytes,
}

impl FormFile {
    pub(crate) fn new(name: String, filename: String, headers: ValueMap, content: Bytes) -> Self {
        Self {
            name,
            filename,
            headers,
            content,
        }
    }

    /// Returns the form field name of the part.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client-supplied file name.
    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the part's content headers.
    #[inline]
    pub fn headers(&self) -> &ValueMap {
        &self.headers
    }

    /// Returns the buffered content length.
    #[inline]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns `true` if the part has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the buffered content.
    #[inline]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Returns the content as a pull body.
    pub fn body(&self) -> Body {
        Body::new(self.content.clone())
    }
}

// ===== Content type =====

/// Returns the media type of a `Content-Type` value, with parameters and
/// surrounding whitespace stripped.
pub(crate) fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

pub(crate) const URLENCODED: &str = "application/x-www-form-urlencoded";
pub(crate) const MULTIPART: &str = "multipart/form-data";

/// Returns the `boundary` parameter of a multipart `Content-Type` value.
pub(crate) fn boundary(content_type: &str) -> Option<&str> {
    for param in content_type.split(';').skip(1) {
        let mut parts = param.splitn(2, '=');
        let name = parts.next()?.trim();
        if name.eq_ignore_ascii_case("boundary") {
            let value = parts.next()?.trim();
            return Some(value.trim_matches('"'));
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn media_type_strips_parameters() {
        assert_eq!(
            media_type("application/x-www-form-urlencoded; charset=UTF-8"),
            URLENCODED,
        );
        assert_eq!(media_type(" text/html "), "text/html");
    }

    #[test]
    fn boundary_parameter() {
        assert_eq!(
            boundary("multipart/form-data; boundary=----abc123"),
            Some("----abc123"),
        );
        assert_eq!(
            boundary("multipart/form-data; charset=utf-8; boundary=\"quoted\""),
            Some("quoted"),
        );
        assert_eq!(boundary("multipart/form-data"), None);
    }
}
