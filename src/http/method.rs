use std::fmt;

/// HTTP request method.
///
/// Covers the [RFC9110] methods plus PATCH from [RFC5789]; arbitrary methods
/// are not supported.
///
/// [RFC5789]: <https://www.rfc-editor.org/rfc/rfc5789>
/// [RFC9110]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-methods>
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Method(u8);

const NAMES: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

impl Method {
    pub const GET: Method = Method(0);
    pub const HEAD: Method = Method(1);
    pub const POST: Method = Method(2);
    pub const PUT: Method = Method(3);
    pub const DELETE: Method = Method(4);
    pub const CONNECT: Method = Method(5);
    pub const OPTIONS: Method = Method(6);
    pub const TRACE: Method = Method(7);
    pub const PATCH: Method = Method(8);

    /// Parse method from bytes.
    pub const fn from_bytes(bytes: &[u8]) -> Option<Method> {
        Some(match bytes {
            b"GET" => Self::GET,
            b"HEAD" => Self::HEAD,
            b"POST" => Self::POST,
            b"PUT" => Self::PUT,
            b"DELETE" => Self::DELETE,
            b"CONNECT" => Self::CONNECT,
            b"OPTIONS" => Self::OPTIONS,
            b"TRACE" => Self::TRACE,
            b"PATCH" => Self::PATCH,
            _ => return None,
        })
    }

    /// Returns string representation of the method.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        NAMES[self.0 as usize]
    }
}

impl std::str::FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes()).ok_or(UnknownMethod)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown method input.
#[derive(Debug)]
pub struct UnknownMethod;

impl std::error::Error for UnknownMethod {}

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown http method")
    }
}
