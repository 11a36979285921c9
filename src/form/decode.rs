//! Percent/plus codec shared by query, cookie, and form parsing.

/// Collapses `%XX` escapes into a pending byte run so multi-byte sequences
/// split across consecutive escapes decode as one character. The run is
/// converted only when a non-escaped literal interrupts it or at the end.
pub(crate) struct UrlDecoder {
    out: String,
    run: Vec<u8>,
}

impl UrlDecoder {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::new(),
            run: Vec::with_capacity(capacity),
        }
    }

    /// Append a decoded or ASCII byte to the pending run.
    pub(crate) fn push_byte(&mut self, byte: u8) {
        self.run.push(byte);
    }

    /// Append literal non-ASCII bytes, interrupting the pending run.
    pub(crate) fn push_literal(&mut self, bytes: &[u8]) {
        self.flush();
        push_lossy(&mut self.out, bytes);
    }

    fn flush(&mut self) {
        if !self.run.is_empty() {
            push_lossy(&mut self.out, &self.run);
            self.run.clear();
        }
    }

    pub(crate) fn finish(mut self) -> String {
        self.flush();
        self.out
    }
}

fn push_lossy(out: &mut String, bytes: &[u8]) {
    match str::from_utf8(bytes) {
        Ok(s) => out.push_str(s),
        Err(_) => out.push_str(&String::from_utf8_lossy(bytes)),
    }
}

/// Decode one accumulated raw token: `+` to space, valid `%XX` to a raw
/// byte, anything else kept as is. An incomplete trailing escape (`%` or
/// `%X`) stays literal.
pub(crate) fn url_decode(raw: &[u8]) -> String {
    let mut decoder = UrlDecoder::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let byte = raw[i];
        match byte {
            b'+' => {
                decoder.push_byte(b' ');
                i += 1;
            }
            b'%' if i + 2 < raw.len() => match (hex(raw[i + 1]), hex(raw[i + 2])) {
                (Some(hi), Some(lo)) => {
                    decoder.push_byte(hi << 4 | lo);
                    i += 3;
                }
                _ => {
                    decoder.push_byte(b'%');
                    i += 1;
                }
            },
            0x00..=0x7f => {
                decoder.push_byte(byte);
                i += 1;
            }
            _ => {
                let end = raw[i..]
                    .iter()
                    .position(|b| b.is_ascii())
                    .map(|at| i + at)
                    .unwrap_or(raw.len());
                decoder.push_literal(&raw[i..end]);
                i = end;
            }
        }
    }
    decoder.finish()
}

const fn hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

const UPPERHEX: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode into `out`, keeping only unreserved characters
/// (`ALPHA / DIGIT / "-" / "." / "_" / "~"`) as is.
pub(crate) fn url_encode_into(out: &mut String, raw: &str) {
    for &byte in raw.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push(UPPERHEX[usize::from(byte >> 4)] as char);
                out.push(UPPERHEX[usize::from(byte & 0xf)] as char);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plus_and_percent() {
        assert_eq!(url_decode(b"John+Doe"), "John Doe");
        assert_eq!(url_decode(b"New%20York"), "New York");
        assert_eq!(url_decode(b"a%2Bb"), "a+b");
    }

    #[test]
    fn incomplete_escape_is_literal() {
        assert_eq!(url_decode(b"100%"), "100%");
        assert_eq!(url_decode(b"100%2"), "100%2");
        assert_eq!(url_decode(b"%ZZok"), "%ZZok");
    }

    #[test]
    fn multibyte_run_reassembles() {
        // U+20AC split across three escapes
        assert_eq!(url_decode(b"%E2%82%AC"), "\u{20AC}");
        // interrupted by ASCII, which joins the same byte run
        assert_eq!(url_decode(b"%E2%82%ACx"), "\u{20AC}x");
        // literal non-ASCII interrupts and survives
        assert_eq!(url_decode("é%20è".as_bytes()), "é è");
    }

    #[test]
    fn truncated_sequence_is_replaced() {
        let decoded = url_decode(b"%E2%82x");
        assert!(decoded.ends_with('x'));
        assert!(decoded.contains('\u{FFFD}'));
    }

    #[test]
    fn encode_round_trip() {
        let mut out = String::new();
        url_encode_into(&mut out, "a b+c/é");
        assert_eq!(out, "a%20b%2Bc%2F%C3%A9");
        assert_eq!(url_decode(out.as_bytes()), "a b+c/é");
    }
}
