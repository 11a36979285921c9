//! Request and response body.
use bytes::{Bytes, BytesMut};
use std::{
    fmt, io,
    task::{Context, Poll},
};

mod collect;
mod drain;

pub use collect::Collect;
pub use drain::Drain;

// ===== ReadBody =====

/// Pull source for request body bytes, plugged in by the transport.
///
/// `Ok(0)` signals end of body.
pub trait ReadBody: Send + Sync {
    /// Try to read body bytes into the buffer.
    fn poll_read(&mut self, buf: &mut [u8], cx: &mut Context) -> Poll<io::Result<usize>>;
}

impl ReadBody for Bytes {
    fn poll_read(&mut self, buf: &mut [u8], _: &mut Context) -> Poll<io::Result<usize>> {
        let read = buf.len().min(self.len());
        buf[..read].copy_from_slice(&self[..read]);
        bytes::Buf::advance(self, read);
        Poll::Ready(Ok(read))
    }
}

// ===== Body =====

/// Request body: buffered bytes, optionally followed by a transport reader.
#[derive(Default)]
pub struct Body {
    bytes: Bytes,
    reader: Option<Box<dyn ReadBody>>,
}

impl Body {
    /// Create exact size buffered [`Body`].
    #[inline]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            reader: None,
        }
    }

    /// Create an empty [`Body`].
    #[inline]
    pub fn empty() -> Self {
        Self {
            bytes: Bytes::new(),
            reader: None,
        }
    }

    /// Create [`Body`] that pulls from the given reader.
    ///
    /// `bytes` holds data already read off the transport ahead of the body.
    #[inline]
    pub fn from_reader(bytes: Bytes, reader: impl ReadBody + 'static) -> Self {
        Self {
            bytes,
            reader: Some(Box::new(reader)),
        }
    }

    /// Returns the buffered part of the body.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Try to read body bytes into the buffer, buffered part first.
    ///
    /// `Ok(0)` signals end of body.
    pub fn poll_read(&mut self, buf: &mut [u8], cx: &mut Context) -> Poll<io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        if !self.bytes.is_empty() {
            let read = buf.len().min(self.bytes.len());
            buf[..read].copy_from_slice(&self.bytes[..read]);
            bytes::Buf::advance(&mut self.bytes, read);
            return Poll::Ready(Ok(read));
        }

        match self.reader.as_mut() {
            Some(reader) => reader.poll_read(buf, cx),
            None => Poll::Ready(Ok(0)),
        }
    }

    /// Try to read up to `max` body bytes, appending to the buffer.
    pub fn poll_read_buf(
        &mut self,
        buf: &mut BytesMut,
        max: usize,
        cx: &mut Context,
    ) -> Poll<io::Result<usize>> {
        let start = buf.len();
        buf.resize(start + max, 0);
        let result = self.poll_read(&mut buf[start..], cx);
        match &result {
            Poll::Ready(Ok(read)) => buf.truncate(start + read),
            _ => buf.truncate(start),
        }
        result
    }

    /// Read body bytes into the buffer.
    ///
    /// `Ok(0)` signals end of body.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        std::future::poll_fn(|cx| self.poll_read(buf, cx)).await
    }

    /// Collect the entire body into [`Bytes`].
    #[inline]
    pub fn collect(self) -> Collect {
        Collect::new(self)
    }

    /// Read the remaining body and discard it.
    #[inline]
    pub fn drain(&mut self) -> Drain<'_> {
        Drain::new(self)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("buffered", &self.bytes.len())
            .field("reader", &self.reader.is_some())
            .finish()
    }
}

// ===== WriteBody =====

/// Push sink for response body bytes, plugged in by the transport.
pub trait WriteBody: Send + Sync {
    /// Try to write bytes into the sink.
    fn poll_write(&mut self, buf: &[u8], cx: &mut Context) -> Poll<io::Result<usize>>;

    /// Try to flush the sink.
    fn poll_flush(&mut self, cx: &mut Context) -> Poll<io::Result<()>>;
}

impl WriteBody for BytesMut {
    fn poll_write(&mut self, buf: &[u8], _: &mut Context) -> Poll<io::Result<usize>> {
        self.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(&mut self, _: &mut Context) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

// ===== ResponseBody =====

/// Response body: writes buffer in memory until flushed into the transport
/// sink.
#[derive(Default)]
pub struct ResponseBody {
    buffer: BytesMut,
    sink: Option<Box<dyn WriteBody>>,
}

impl ResponseBody {
    /// Create [`ResponseBody`] that buffers in memory only.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create [`ResponseBody`] flushing into the given sink.
    #[inline]
    pub fn from_sink(sink: impl WriteBody + 'static) -> Self {
        Self {
            buffer: BytesMut::new(),
            sink: Some(Box::new(sink)),
        }
    }

    /// Append bytes to the write buffer without touching the transport.
    #[inline]
    pub fn write(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Returns bytes written but not yet flushed.
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Try to push the write buffer into the sink and flush it.
    ///
    /// Without a sink the buffer is kept as is.
    pub fn poll_flush(&mut self, cx: &mut Context) -> Poll<io::Result<()>> {
        let Some(sink) = self.sink.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        while !self.buffer.is_empty() {
            match std::task::ready!(sink.poll_write(&self.buffer, cx)) {
                Ok(0) => return Poll::Ready(Err(io::ErrorKind::WriteZero.into())),
                Ok(written) => {
                    bytes::Buf::advance(&mut self.buffer, written);
                }
                Err(err) => return Poll::Ready(Err(err)),
            }
        }
        sink.poll_flush(cx)
    }

    /// Push the write buffer into the sink and flush it.
    pub async fn flush(&mut self) -> io::Result<()> {
        std::future::poll_fn(|cx| self.poll_flush(cx)).await
    }

    /// Take the buffered bytes, leaving the buffer empty.
    pub fn take_buffered(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("buffered", &self.buffer.len())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn body_serves_buffered_then_reader() {
        let mut body = Body::from_reader(Bytes::from_static(b"ab"), Bytes::from_static(b"cd"));
        let mut buf = [0u8; 8];

        let read = body.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..read], b"ab");

        let read = body.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..read], b"cd");

        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn collect_and_drain() {
        let body = Body::from_reader(Bytes::from_static(b"he"), Bytes::from_static(b"llo"));
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"hello"));

        let mut body = Body::from_reader(Bytes::new(), Bytes::from_static(b"rest"));
        body.drain().await.unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn response_body_flushes_into_sink() {
        let mut body = ResponseBody::from_sink(BytesMut::new());
        body.write(b"status");
        assert_eq!(body.buffered(), b"status");

        body.flush().await.unwrap();
        assert!(body.buffered().is_empty());
    }
}
