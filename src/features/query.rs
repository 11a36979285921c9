//! Lazily parsed query string capability.
use crate::{
    form::decode::{url_decode, url_encode_into},
    values::ValueMap,
};

/// Parsed query values, cached against the raw query string they were
/// computed from.
///
/// The parsed mapping is valid exactly while the raw string read from the
/// request capability compares equal to the one remembered here; any
/// mismatch rebuilds the mapping from scratch.
#[derive(Debug, Default)]
pub struct QueryFeature {
    original: Option<String>,
    parsed: Option<ValueMap>,
    fixed: bool,
}

impl QueryFeature {
    /// Create [`QueryFeature`] that derives from the raw query string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create [`QueryFeature`] with authoritative values that ignore the raw
    /// query string.
    pub fn fixed(values: ValueMap) -> Self {
        Self {
            original: None,
            parsed: Some(values),
            fixed: true,
        }
    }

    /// Returns `true` when the cached mapping no longer matches `raw`.
    pub(crate) fn is_stale(&self, raw: &str) -> bool {
        if self.fixed {
            return false;
        }
        self.parsed.is_none() || self.original.as_deref() != Some(raw)
    }

    /// Cache `values` as the parse of `raw`.
    pub(crate) fn store(&mut self, raw: String, values: ValueMap) {
        self.original = Some(raw);
        self.parsed = Some(values);
        self.fixed = false;
    }

    pub(crate) fn values_mut(&mut self) -> &mut Option<ValueMap> {
        &mut self.parsed
    }
}

// ===== Parsing =====

/// Parse a raw query string into a multi-value mapping.
///
/// Splits on `&`, each segment on its first `=`, plus/percent decodes key
/// and value, and accumulates case-insensitively in first-seen order. A
/// segment without `=` becomes a key with one empty value; empty segments
/// are dropped.
pub(crate) fn parse_query(raw: &str) -> ValueMap {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut values = ValueMap::new();
    for segment in raw.split('&') {
        if segment.is_empty() {
            continue;
        }
        let (key, value) = match segment.split_once('=') {
            Some((key, value)) => (key, value),
            None => (segment, ""),
        };
        values.append(url_decode(key.as_bytes()), url_decode(value.as_bytes()));
    }
    values
}

/// Serialize a multi-value mapping into canonical `k=v&k=v` form, percent
/// encoding both keys and values.
pub(crate) fn serialize_query(values: &ValueMap) -> String {
    let mut out = String::new();
    for (key, entry) in values.iter() {
        for value in entry {
            if !out.is_empty() {
                out.push('&');
            }
            url_encode_into(&mut out, key);
            out.push('=');
            url_encode_into(&mut out, value);
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_multi_values() {
        let values = parse_query("a=1&a=2&b=");
        assert_eq!(
            values.value("a").iter().collect::<Vec<_>>(),
            ["1", "2"],
        );
        assert_eq!(values.first("b"), Some(""));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn key_without_equals() {
        let values = parse_query("?flag&x=1");
        assert_eq!(values.first("flag"), Some(""));
        assert_eq!(values.first("x"), Some("1"));
    }

    #[test]
    fn round_trip_is_idempotent() {
        let parsed = parse_query("a=1&a=2&b=");
        let serialized = serialize_query(&parsed);
        assert_eq!(parse_query(&serialized), parsed);
        assert_eq!(serialized, "a=1&a=2&b=");
    }

    #[test]
    fn decodes_escapes() {
        let values = parse_query("name=John+Doe&city=New%20York");
        assert_eq!(values.first("name"), Some("John Doe"));
        assert_eq!(values.first("city"), Some("New York"));
    }

    #[test]
    fn staleness_tracks_raw() {
        let mut feature = QueryFeature::new();
        assert!(feature.is_stale(""));

        feature.store("a=1".into(), parse_query("a=1"));
        assert!(!feature.is_stale("a=1"));
        assert!(feature.is_stale("a=2"));

        // fixed values never go stale
        let fixed = QueryFeature::fixed(parse_query("x=1"));
        assert!(!fixed.is_stale("anything"));
    }
}
