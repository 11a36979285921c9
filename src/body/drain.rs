use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use super::Body;

/// A future returned from [`Body::drain`], which reads the remaining body and
/// discards it.
#[derive(Debug)]
pub struct Drain<'a> {
    body: &'a mut Body,
}

impl<'a> Drain<'a> {
    pub(crate) fn new(body: &'a mut Body) -> Self {
        Self { body }
    }
}

impl Future for Drain<'_> {
    type Output = io::Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let me = self.get_mut();
        let mut sink = [0u8; 4 * 1024];
        loop {
            match ready!(me.body.poll_read(&mut sink, cx)) {
                Ok(0) => return Poll::Ready(Ok(())),
                Ok(_) => {}
                Err(err) => return Poll::Ready(Err(err)),
            }
        }
    }
}
