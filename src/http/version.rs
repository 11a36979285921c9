use std::fmt;

/// HTTP protocol version.
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Version(Inner);

#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
enum Inner {
    Http10,
    Http11,
    H2,
    H3,
}

impl Version {
    /// `HTTP/1.0`
    pub const HTTP_10: Version = Version(Inner::Http10);

    /// `HTTP/1.1`
    pub const HTTP_11: Version = Version(Inner::Http11);

    /// `HTTP/2`
    pub const HTTP_2: Version = Version(Inner::H2);

    /// `HTTP/3`
    pub const HTTP_3: Version = Version(Inner::H3);

    /// Returns the protocol string, e.g: `"HTTP/1.1"`.
    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            Inner::Http10 => "HTTP/1.0",
            Inner::Http11 => "HTTP/1.1",
            Inner::H2 => "HTTP/2",
            Inner::H3 => "HTTP/3",
        }
    }
}

impl Default for Version {
    #[inline]
    fn default() -> Version {
        Version::HTTP_11
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
