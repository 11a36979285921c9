//! Incremental `x-www-form-urlencoded` pair reader.
//!
//! Grammar: `pair ("&" pair)*` where a key token ends at `=` and a value
//! token ends at `&` or end of input. End of input with an empty pending key
//! and no buffered bytes means "no more pairs", which distinguishes an
//! exhausted stream from one final empty pair.
use bytes::{Buf, BytesMut};
use std::task::{Context, Poll, ready};

use crate::{body::Body, features::lifetime::CancelSignal, values::ValueMap};

use super::{
    FormOptions,
    accumulator::Accumulator,
    decode::url_decode,
    error::{FormError, FormErrorKind},
};

/// One decoded `key=value` pair.
pub type Pair = (String, String);

// ===== FormReader =====

/// Synchronous pair reader over fully buffered form data.
#[derive(Debug)]
pub struct FormReader<'a> {
    input: &'a [u8],
    builder: Vec<u8>,
    key_length_limit: usize,
    value_length_limit: usize,
}

impl<'a> FormReader<'a> {
    /// Create [`FormReader`] with the default limits.
    pub fn new(data: &'a str) -> Self {
        Self::with_options(data, &FormOptions::default())
    }

    /// Create [`FormReader`] with limits from `options`.
    pub fn with_options(data: &'a str, options: &FormOptions) -> Self {
        Self {
            input: data.as_bytes(),
            builder: Vec::new(),
            key_length_limit: options.key_length_limit,
            value_length_limit: options.value_length_limit,
        }
    }

    /// Read the next decoded pair, or [`None`] when the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns error when a token exceeds its length limit.
    pub fn read_pair(&mut self) -> Result<Option<Pair>, FormError> {
        let key = self.read_word(b'=')?;
        if key.is_empty() && self.input.is_empty() {
            return Ok(None);
        }
        let value = self.read_word(b'&')?;
        Ok(Some((key, value)))
    }

    fn read_word(&mut self, separator: u8) -> Result<String, FormError> {
        loop {
            let Some((&byte, rest)) = self.input.split_first() else {
                return Ok(self.build_word());
            };
            self.input = rest;

            if byte == separator {
                return Ok(self.build_word());
            }

            self.builder.push(byte);
            check_limit(
                self.builder.len(),
                separator,
                self.key_length_limit,
                self.value_length_limit,
            )?;
        }
    }

    fn build_word(&mut self) -> String {
        let word = url_decode(&self.builder);
        self.builder.clear();
        word
    }

    /// Read every pair into a multi-value mapping.
    ///
    /// # Errors
    ///
    /// Returns error when a limit is exceeded.
    pub fn read_form(data: &'a str, options: &FormOptions) -> Result<ValueMap, FormError> {
        let mut reader = Self::with_options(data, options);
        let mut accumulator = Accumulator::new(options.value_count_limit);
        while let Some((key, value)) = reader.read_pair()? {
            accumulator.append(key, value)?;
        }
        Ok(accumulator.into_map())
    }
}

fn check_limit(
    len: usize,
    separator: u8,
    key_limit: usize,
    value_limit: usize,
) -> Result<(), FormError> {
    if separator == b'=' {
        if len > key_limit {
            return Err(FormErrorKind::KeyLengthLimit(key_limit).into());
        }
    } else if len > value_limit {
        return Err(FormErrorKind::ValueLengthLimit(value_limit).into());
    }
    Ok(())
}

// ===== BodyFormReader =====

/// Token currently being accumulated.
#[derive(Debug, Default)]
enum Token {
    #[default]
    Key,
    Value(String),
}

/// Asynchronous pair reader pulling from a request [`Body`] through a
/// fixed-size refill buffer.
///
/// Suspends only while refilling the buffer, never mid-token, and produces
/// exactly the output of [`FormReader`] for the same input. The cancellation
/// signal is observed before each refill.
#[derive(Debug)]
pub struct BodyFormReader<'a> {
    body: &'a mut Body,
    buffer: BytesMut,
    buffer_size: usize,
    eof: bool,
    builder: Vec<u8>,
    token: Token,
    cancel: Option<CancelSignal>,
    key_length_limit: usize,
    value_length_limit: usize,
}

impl<'a> BodyFormReader<'a> {
    /// Create [`BodyFormReader`] with limits from `options`.
    pub fn new(body: &'a mut Body, options: &FormOptions) -> Self {
        Self {
            body,
            buffer: BytesMut::with_capacity(options.buffer_size),
            buffer_size: options.buffer_size,
            eof: false,
            builder: Vec::new(),
            token: Token::Key,
            cancel: None,
            key_length_limit: options.key_length_limit,
            value_length_limit: options.value_length_limit,
        }
    }

    /// Observe the given cancellation signal at every refill.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Try to read the next decoded pair, or [`None`] when the body is
    /// exhausted.
    pub fn poll_read_pair(&mut self, cx: &mut Context) -> Poll<Result<Option<Pair>, FormError>> {
        loop {
            if let Some(pair) = self.scan_buffer()? {
                return Poll::Ready(Ok(Some(pair)));
            }

            if self.eof {
                return Poll::Ready(self.finish());
            }

            if let Some(cancel) = &self.cancel
                && cancel.is_cancelled()
            {
                return Poll::Ready(Err(FormErrorKind::Cancelled.into()));
            }

            let read = ready!(self.body.poll_read_buf(&mut self.buffer, self.buffer_size, cx))
                .map_err(FormError::from)?;
            if read == 0 {
                self.eof = true;
            }
        }
    }

    /// Read the next decoded pair, or [`None`] when the body is exhausted.
    ///
    /// # Errors
    ///
    /// Returns error when a limit is exceeded, the read is cancelled, or the
    /// body read fails.
    pub async fn read_pair(&mut self) -> Result<Option<Pair>, FormError> {
        std::future::poll_fn(|cx| self.poll_read_pair(cx)).await
    }

    /// Consume buffered bytes until a pair completes or the buffer runs dry.
    fn scan_buffer(&mut self) -> Result<Option<Pair>, FormError> {
        while !self.buffer.is_empty() {
            let byte = self.buffer[0];
            self.buffer.advance(1);

            match &self.token {
                Token::Key => {
                    if byte == b'=' {
                        self.token = Token::Value(self.build_word());
                        continue;
                    }
                    self.builder.push(byte);
                    check_limit(self.builder.len(), b'=', self.key_length_limit, 0)?;
                }
                Token::Value(_) => {
                    if byte == b'&' {
                        let value = self.build_word();
                        let Token::Value(key) = std::mem::take(&mut self.token) else {
                            unreachable!("token is a value in this arm");
                        };
                        return Ok(Some((key, value)));
                    }
                    self.builder.push(byte);
                    check_limit(self.builder.len(), b'&', 0, self.value_length_limit)?;
                }
            }
        }
        Ok(None)
    }

    /// End of input: flush the pending token into one final pair, or report
    /// exhaustion when nothing is pending.
    fn finish(&mut self) -> Result<Option<Pair>, FormError> {
        match std::mem::take(&mut self.token) {
            Token::Key => {
                let key = self.build_word();
                if key.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some((key, String::new())))
                }
            }
            Token::Value(key) => Ok(Some((key, self.build_word()))),
        }
    }

    fn build_word(&mut self) -> String {
        let word = url_decode(&self.builder);
        self.builder.clear();
        word
    }

    /// Read every pair into a multi-value mapping.
    ///
    /// # Errors
    ///
    /// Returns error when a limit is exceeded, the read is cancelled, or the
    /// body read fails.
    pub async fn read_form(
        body: &'a mut Body,
        options: &FormOptions,
        cancel: Option<CancelSignal>,
    ) -> Result<ValueMap, FormError> {
        let mut reader = Self::new(body, options);
        reader.cancel = cancel;
        let mut accumulator = Accumulator::new(options.value_count_limit);
        while let Some((key, value)) = reader.read_pair().await? {
            accumulator.append(key, value)?;
        }
        Ok(accumulator.into_map())
    }
}

impl futures_core::Stream for BodyFormReader<'_> {
    type Item = Result<Pair, FormError>;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut Context,
    ) -> Poll<Option<Self::Item>> {
        match ready!(self.get_mut().poll_read_pair(cx)) {
            Ok(Some(pair)) => Poll::Ready(Some(Ok(pair))),
            Ok(None) => Poll::Ready(None),
            Err(err) => Poll::Ready(Some(Err(err))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::Bytes;

    fn pairs(data: &str) -> Vec<Pair> {
        let mut reader = FormReader::new(data);
        let mut out = Vec::new();
        while let Some(pair) = reader.read_pair().unwrap() {
            out.push(pair);
        }
        out
    }

    async fn body_pairs(data: &'static str) -> Vec<Pair> {
        // one-byte refills exercise token accumulation across chunks
        let options = FormOptions {
            buffer_size: 1,
            ..FormOptions::default()
        };
        let mut body = Body::from_reader(Bytes::new(), Bytes::from_static(data.as_bytes()));
        let mut reader = BodyFormReader::new(&mut body, &options);
        let mut out = Vec::new();
        while let Some(pair) = reader.read_pair().await.unwrap() {
            out.push(pair);
        }
        out
    }

    #[test]
    fn decodes_pairs() {
        assert_eq!(
            pairs("name=John+Doe&city=New%20York"),
            [
                ("name".into(), "John Doe".into()),
                ("city".into(), "New York".into()),
            ]
        );
    }

    #[test]
    fn incomplete_escape_stays_literal() {
        assert_eq!(pairs("x=100%"), [("x".into(), "100%".into())]);
    }

    #[test]
    fn distinguishes_empty_input_from_empty_pair() {
        assert_eq!(pairs(""), []);
        assert_eq!(pairs("a="), [("a".into(), "".into())]);

        let mut reader = FormReader::new("a=");
        assert!(reader.read_pair().unwrap().is_some());
        assert!(reader.read_pair().unwrap().is_none());
    }

    #[test]
    fn key_without_separator_gets_empty_value() {
        assert_eq!(pairs("flag"), [("flag".into(), "".into())]);
    }

    #[test]
    fn read_form_static() {
        let map = FormReader::read_form("a=1&a=2&b=", &FormOptions::default()).unwrap();
        assert_eq!(map.value("a").iter().collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(map.first("b"), Some(""));
    }

    #[test]
    fn key_length_limit() {
        let options = FormOptions {
            key_length_limit: 4,
            ..FormOptions::default()
        };
        let mut reader = FormReader::with_options("toolong=1", &options);
        let err = reader.read_pair().unwrap_err();
        assert!(matches!(err.kind(), FormErrorKind::KeyLengthLimit(4)));
    }

    #[tokio::test]
    async fn async_path_matches_sync() {
        for data in [
            "",
            "a=",
            "name=John+Doe&city=New%20York",
            "x=100%",
            "a=1&a=2&b=",
            "euro=%E2%82%AC",
        ] {
            assert_eq!(body_pairs(data).await, pairs(data), "input: {data:?}");
        }
    }

    #[tokio::test]
    async fn cancelled_before_refill() {
        let cancel = CancelSignal::new();
        cancel.cancel();

        let mut body = Body::from_reader(Bytes::new(), Bytes::from_static(b"a=1"));
        let mut reader =
            BodyFormReader::new(&mut body, &FormOptions::default()).with_cancel(cancel);
        let err = reader.read_pair().await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn read_form_accumulates() {
        let mut body = Body::from_reader(Bytes::new(), Bytes::from_static(b"a=1&a=2&b="));
        let map = BodyFormReader::read_form(&mut body, &FormOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(map.value("a").len(), 2);
        assert_eq!(map.first("b"), Some(""));
    }
}
