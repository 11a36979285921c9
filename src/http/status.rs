use std::{fmt, num::NonZeroU16};

/// HTTP [status code][rfc].
///
/// Any value in `100..=999` is accepted; the canonical reason phrase is known
/// only for registered codes.
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc9110#name-status-codes>
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(NonZeroU16);

impl Default for StatusCode {
    #[inline]
    fn default() -> Self {
        Self::OK
    }
}

impl StatusCode {
    /// Parse status code from integer.
    ///
    /// # Errors
    ///
    /// Returns error when the value is outside `100..=999`.
    #[inline]
    pub const fn from_u16(code: u16) -> Result<StatusCode, InvalidStatusCode> {
        match code {
            100..=999 => match NonZeroU16::new(code) {
                Some(code) => Ok(Self(code)),
                None => Err(InvalidStatusCode),
            },
            _ => Err(InvalidStatusCode),
        }
    }

    /// Returns the integer value, e.g: `200`.
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0.get()
    }

    /// Returns `true` for a `2xx` code.
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self.0.get(), 200..=299)
    }
}

macro_rules! reasons {
    (
        $(
            $int:literal $id:ident $msg:literal;
        )*
    ) => {
        impl StatusCode {
            $(
                #[doc = concat!("`", stringify!($int), " ", $msg, "`")]
                pub const $id: Self = Self(NonZeroU16::new($int).unwrap());
            )*

            /// Returns the canonical reason phrase, e.g: `"OK"`.
            ///
            /// Unregistered codes have none.
            pub const fn reason(&self) -> Option<&'static str> {
                match self.0.get() {
                    $(
                        $int => Some($msg),
                    )*
                    _ => None,
                }
            }
        }
    };
}

reasons! {
    100 CONTINUE "Continue";
    101 SWITCHING_PROTOCOLS "Switching Protocols";
    200 OK "OK";
    201 CREATED "Created";
    202 ACCEPTED "Accepted";
    204 NO_CONTENT "No Content";
    301 MOVED_PERMANENTLY "Moved Permanently";
    302 FOUND "Found";
    303 SEE_OTHER "See Other";
    304 NOT_MODIFIED "Not Modified";
    307 TEMPORARY_REDIRECT "Temporary Redirect";
    308 PERMANENT_REDIRECT "Permanent Redirect";
    400 BAD_REQUEST "Bad Request";
    401 UNAUTHORIZED "Unauthorized";
    403 FORBIDDEN "Forbidden";
    404 NOT_FOUND "Not Found";
    405 METHOD_NOT_ALLOWED "Method Not Allowed";
    406 NOT_ACCEPTABLE "Not Acceptable";
    408 REQUEST_TIMEOUT "Request Timeout";
    409 CONFLICT "Conflict";
    411 LENGTH_REQUIRED "Length Required";
    413 CONTENT_TOO_LARGE "Content Too Large";
    414 URI_TOO_LONG "URI Too Long";
    415 UNSUPPORTED_MEDIA_TYPE "Unsupported Media Type";
    422 UNPROCESSABLE_CONTENT "Unprocessable Content";
    429 TOO_MANY_REQUESTS "Too Many Requests";
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
    501 NOT_IMPLEMENTED "Not Implemented";
    502 BAD_GATEWAY "Bad Gateway";
    503 SERVICE_UNAVAILABLE "Service Unavailable";
    504 GATEWAY_TIMEOUT "Gateway Timeout";
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = itoa::Buffer::new();
        f.write_str(buf.format(self.0.get()))?;
        if let Some(reason) = self.reason() {
            f.write_str(" ")?;
            f.write_str(reason)?;
        }
        Ok(())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = itoa::Buffer::new();
        f.write_str(buf.format(self.0.get()))
    }
}

/// Error for status code input outside `100..=999`.
#[derive(Debug)]
pub struct InvalidStatusCode;

impl std::error::Error for InvalidStatusCode {}

impl fmt::Display for InvalidStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid status code")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_reason() {
        assert_eq!(StatusCode::from_u16(200).unwrap(), StatusCode::OK);
        assert_eq!(StatusCode::OK.reason(), Some("OK"));
        assert_eq!(StatusCode::from_u16(599).unwrap().reason(), None);
        assert!(StatusCode::from_u16(99).is_err());
        assert!(StatusCode::from_u16(1000).is_err());
    }
}
