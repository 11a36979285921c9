use bytes::{Bytes, BytesMut};
use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use super::Body;

const CHUNK: usize = 8 * 1024;

/// A future returned from [`Body::collect`], which buffers the entire body.
#[derive(Debug)]
pub struct Collect {
    body: Body,
    buffer: Option<Buffer>,
}

/// One contiguous [`Bytes`] is handed back without copying; a reader-backed
/// body concatenates into [`BytesMut`].
#[derive(Debug)]
enum Buffer {
    None,
    Ref(Bytes),
    Mut(BytesMut),
}

impl Collect {
    pub(crate) fn new(mut body: Body) -> Self {
        let buffered = std::mem::take(&mut body.bytes);
        let buffer = if body.reader.is_none() {
            Buffer::Ref(buffered)
        } else if buffered.is_empty() {
            Buffer::None
        } else {
            let mut bytes = BytesMut::with_capacity(buffered.len() + CHUNK);
            bytes.extend_from_slice(&buffered);
            Buffer::Mut(bytes)
        };
        Self {
            body,
            buffer: Some(buffer),
        }
    }

    fn take_buffer(&mut self) -> Bytes {
        match self.buffer.take() {
            Some(Buffer::None) | None => Bytes::new(),
            Some(Buffer::Ref(bytes)) => bytes,
            Some(Buffer::Mut(bytes)) => bytes.freeze(),
        }
    }
}

impl Future for Collect {
    type Output = io::Result<Bytes>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let me = self.get_mut();

        if matches!(me.buffer, Some(Buffer::Ref(_))) {
            return Poll::Ready(Ok(me.take_buffer()));
        }

        loop {
            let buffer = match me.buffer.as_mut() {
                Some(Buffer::Mut(bytes)) => bytes,
                Some(buffer) => {
                    *buffer = Buffer::Mut(BytesMut::with_capacity(CHUNK));
                    continue;
                }
                None => return Poll::Ready(Err(io::ErrorKind::UnexpectedEof.into())),
            };

            match ready!(me.body.poll_read_buf(buffer, CHUNK, cx)) {
                Ok(0) => return Poll::Ready(Ok(me.take_buffer())),
                Ok(_) => {}
                Err(err) => return Poll::Ready(Err(err)),
            }
        }
    }
}
