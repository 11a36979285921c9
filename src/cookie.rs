//! Cookie-pair parsing and `Set-Cookie` formatting.
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    form::decode::{url_decode, url_encode_into},
    http::httpdate,
    log::debug,
    values::ValueMap,
};

// ===== Parsing =====

/// Parse `Cookie` header lines into a name to value mapping.
///
/// Walks a semicolon/comma delimited cookie-pair grammar: surrounding double
/// quotes around a value are stripped, then name and value are independently
/// plus/percent decoded. Malformed segments are skipped, they never abort the
/// whole parse. A repeated name keeps the last value.
pub(crate) fn parse_cookies<'a>(lines: impl Iterator<Item = &'a str>) -> ValueMap {
    let mut map = ValueMap::new();
    for line in lines {
        for segment in line.split([';', ',']) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let Some((name, value)) = segment.split_once('=') else {
                debug!("skipping malformed cookie segment {segment:?}");
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                debug!("skipping cookie segment with empty name");
                continue;
            }
            let value = trim_quotes(value.trim());
            map.insert(url_decode(name.as_bytes()), url_decode(value.as_bytes()));
        }
    }
    map
}

fn trim_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

// ===== CookieOptions =====

/// Attributes carried on a formatted `Set-Cookie` value.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    /// `Domain` attribute.
    pub domain: Option<String>,
    /// `Path` attribute, `/` unless overridden.
    pub path: Option<String>,
    /// `Expires` attribute.
    pub expires: Option<SystemTime>,
    /// `Secure` flag.
    pub secure: bool,
    /// `HttpOnly` flag.
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            domain: None,
            path: Some("/".to_owned()),
            expires: None,
            secure: false,
            http_only: false,
        }
    }
}

// ===== Formatting =====

/// Format one `Set-Cookie` header value.
pub(crate) fn format_set_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut out = String::new();
    url_encode_into(&mut out, name);
    out.push('=');
    url_encode_into(&mut out, value);

    if let Some(expires) = options.expires {
        out.push_str("; expires=");
        let date = httpdate(expires);
        // httpdate output is ASCII
        out.push_str(str::from_utf8(&date).unwrap_or_default());
    }
    if let Some(domain) = &options.domain {
        out.push_str("; domain=");
        out.push_str(domain);
    }
    if let Some(path) = &options.path {
        out.push_str("; path=");
        out.push_str(path);
    }
    if options.secure {
        out.push_str("; secure");
    }
    if options.http_only {
        out.push_str("; httponly");
    }
    out
}

/// Format an expired `Set-Cookie` value that deletes the cookie, keeping the
/// path/domain attributes that scope the deletion.
pub(crate) fn format_expired_cookie(name: &str, options: &CookieOptions) -> String {
    let expired = CookieOptions {
        expires: Some(UNIX_EPOCH),
        ..options.clone()
    };
    format_set_cookie(name, "", &expired)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_pairs() {
        let map = parse_cookies(["a=1; b=2"].into_iter());
        assert_eq!(map.first("a"), Some("1"));
        assert_eq!(map.first("b"), Some("2"));
    }

    #[test]
    fn skips_malformed_segments() {
        let map = parse_cookies(["a=1; bad; b=2"].into_iter());
        assert_eq!(map.len(), 2);
        assert_eq!(map.first("a"), Some("1"));
        assert_eq!(map.first("b"), Some("2"));
        assert!(map.get("bad").is_none());
    }

    #[test]
    fn decodes_and_unquotes() {
        let map = parse_cookies(["name=\"John+Doe\"; city=New%20York"].into_iter());
        assert_eq!(map.first("name"), Some("John Doe"));
        assert_eq!(map.first("city"), Some("New York"));
    }

    #[test]
    fn multiple_lines_and_repeats() {
        let map = parse_cookies(["a=1", "a=2, b=3"].into_iter());
        assert_eq!(map.first("a"), Some("2"));
        assert_eq!(map.first("b"), Some("3"));
    }

    #[test]
    fn formats_attributes() {
        let options = CookieOptions {
            domain: Some("example.com".into()),
            http_only: true,
            ..CookieOptions::default()
        };
        assert_eq!(
            format_set_cookie("id", "a b", &options),
            "id=a%20b; domain=example.com; path=/; httponly",
        );
    }

    #[test]
    fn expired_cookie_keeps_scope() {
        let formatted = format_expired_cookie("id", &CookieOptions::default());
        assert!(formatted.starts_with("id=; expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(formatted.ends_with("; path=/"));
    }
}
