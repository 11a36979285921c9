//! Buffered `multipart/form-data` decoding.
//!
//! Parts are surfaced in wire order; parts with a `filename` become file
//! entries, the rest become field values. Streaming file parts and temp
//! storage spill are deliberately not handled here.
use bytes::Bytes;

use crate::values::ValueMap;

use super::{
    FormFile,
    accumulator::Accumulator,
    error::{FormError, FormErrorKind},
};

/// Decode a fully buffered multipart body delimited by `boundary`.
pub(crate) fn parse_multipart(
    body: &Bytes,
    boundary: &str,
    value_count_limit: usize,
) -> Result<(ValueMap, Vec<FormFile>), FormError> {
    let delimiter = format!("--{boundary}");
    let mut fields = Accumulator::new(value_count_limit);
    let mut files = Vec::new();

    // leading preamble up to the first delimiter is ignored
    let mut at = find(body, 0, delimiter.as_bytes())
        .ok_or(FormErrorKind::Multipart("missing first boundary"))?
        + delimiter.len();

    loop {
        // delimiter is followed by CRLF, or `--` on the terminal one
        if body[at..].starts_with(b"--") {
            break;
        }
        at = skip_crlf(body, at).ok_or(FormErrorKind::Multipart("missing boundary line end"))?;

        let (headers, content_at) = part_headers(body, at)?;
        let content_end = find(body, content_at, delimiter.as_bytes())
            .ok_or(FormErrorKind::Multipart("unterminated part"))?;

        // part content excludes the CRLF owned by the closing delimiter
        let raw_end = content_end
            .checked_sub(2)
            .filter(|end| *end >= content_at && &body[*end..content_end] == b"\r\n")
            .ok_or(FormErrorKind::Multipart("part content not CRLF delimited"))?;
        let content = body.slice(content_at..raw_end);

        let disposition = headers
            .first("content-disposition")
            .ok_or(FormErrorKind::Multipart("part without content disposition"))?;
        let name = disposition_param(disposition, "name")
            .ok_or(FormErrorKind::Multipart("part without field name"))?
            .to_owned();

        match disposition_param(disposition, "filename") {
            Some(filename) => {
                let filename = filename.to_owned();
                files.push(FormFile::new(name, filename, headers, content));
            }
            None => {
                let value = String::from_utf8_lossy(&content).into_owned();
                fields.append(name, value)?;
            }
        }

        at = content_end + delimiter.len();
    }

    Ok((fields.into_map(), files))
}

/// Parse CRLF separated part headers, ending at the empty line.
fn part_headers(body: &Bytes, mut at: usize) -> Result<(ValueMap, usize), FormError> {
    let mut headers = ValueMap::new();
    loop {
        let end = find(body, at, b"\r\n").ok_or(FormErrorKind::Multipart("unterminated header"))?;
        if end == at {
            return Ok((headers, end + 2));
        }
        let line = &body[at..end];
        let mut parts = line.splitn(2, |b| *b == b':');
        let name = parts.next().unwrap_or_default();
        let value = parts
            .next()
            .ok_or(FormErrorKind::Multipart("header without colon"))?;
        headers.append(
            String::from_utf8_lossy(name).trim().to_ascii_lowercase(),
            String::from_utf8_lossy(value).trim().to_owned(),
        );
        at = end + 2;
    }
}

/// Extract a quoted or bare parameter from a `Content-Disposition` value.
fn disposition_param<'a>(disposition: &'a str, name: &str) -> Option<&'a str> {
    for param in disposition.split(';').skip(1) {
        let mut parts = param.splitn(2, '=');
        let param_name = parts.next()?.trim();
        if param_name.eq_ignore_ascii_case(name) {
            return Some(parts.next()?.trim().trim_matches('"'));
        }
    }
    None
}

fn skip_crlf(body: &Bytes, at: usize) -> Option<usize> {
    body[at..].starts_with(b"\r\n").then_some(at + 2)
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| from + at)
}

#[cfg(test)]
mod test {
    use super::*;

    const BODY: &[u8] = b"--XX\r\n\
        content-disposition: form-data; name=\"title\"\r\n\
        \r\n\
        hello\r\n\
        --XX\r\n\
        content-disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
        content-type: text/plain\r\n\
        \r\n\
        file body\r\n\
        --XX--\r\n";

    #[test]
    fn fields_and_files_in_order() {
        let body = Bytes::from_static(BODY);
        let (fields, files) = parse_multipart(&body, "XX", 16).unwrap();

        assert_eq!(fields.first("title"), Some("hello"));
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "file");
        assert_eq!(files[0].filename(), "a.txt");
        assert_eq!(files[0].headers().first("content-type"), Some("text/plain"));
        assert_eq!(files[0].content().as_ref(), b"file body");
    }

    #[test]
    fn missing_boundary_is_error() {
        let body = Bytes::from_static(b"no delimiters here");
        assert!(parse_multipart(&body, "XX", 16).is_err());
    }

    #[test]
    fn empty_part_content() {
        let body = Bytes::from_static(
            b"--B\r\ncontent-disposition: form-data; name=\"empty\"\r\n\r\n\r\n--B--\r\n",
        );
        let (fields, files) = parse_multipart(&body, "B", 16).unwrap();
        assert_eq!(fields.first("empty"), Some(""));
        assert!(files.is_empty());
    }
}
