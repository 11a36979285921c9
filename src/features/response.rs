//! Transport-facing response capability.
use std::fmt;

use crate::{
    body::ResponseBody,
    http::{StatusCode, Version},
    values::ValueMap,
};

type Callback = Box<dyn FnOnce() + Send + Sync>;

/// Status line, headers, and body handed back to the transport.
#[derive(Default)]
pub struct ResponseHead {
    pub status: StatusCode,
    /// Reason phrase override; the canonical phrase applies when unset.
    pub reason: Option<String>,
    pub version: Version,
    pub headers: ValueMap,
    pub body: ResponseBody,
    started: bool,
    on_starting: Vec<Callback>,
    on_completed: Vec<Callback>,
}

impl ResponseHead {
    /// Create [`ResponseHead`] with status `200 OK` and an in-memory body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the response head has been handed to the
    /// transport. Status and headers are frozen from that point.
    #[inline]
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Register a callback to run just before the response starts.
    ///
    /// Callbacks run in reverse registration order.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn on_starting(&mut self, callback: Callback) -> Result<(), ResponseStarted> {
        if self.started {
            return Err(ResponseStarted);
        }
        self.on_starting.push(callback);
        Ok(())
    }

    /// Register a callback to run after the response completes.
    pub fn on_completed(&mut self, callback: Callback) {
        self.on_completed.push(callback);
    }

    /// Mark the response as started, running the start callbacks first.
    ///
    /// Idempotent: a second call does nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        while let Some(callback) = self.on_starting.pop() {
            callback();
        }
        self.started = true;
    }

    /// Run the completion callbacks.
    pub fn complete(&mut self) {
        while let Some(callback) = self.on_completed.pop() {
            callback();
        }
    }
}

impl fmt::Debug for ResponseHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseHead")
            .field("status", &self.status)
            .field("started", &self.started)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Error for head mutation after the response has started.
#[derive(Debug)]
pub struct ResponseStarted;

impl std::error::Error for ResponseStarted {}

impl fmt::Display for ResponseStarted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("response has already started")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering::SeqCst},
    };

    #[test]
    fn start_runs_callbacks_once() {
        let fired = Arc::new(AtomicU32::new(0));
        let mut head = ResponseHead::new();

        let observer = Arc::clone(&fired);
        head.on_starting(Box::new(move || {
            observer.fetch_add(1, SeqCst);
        }))
        .unwrap();

        head.start();
        head.start();
        assert_eq!(fired.load(SeqCst), 1);
        assert!(head.has_started());

        // late registration is rejected
        assert!(head.on_starting(Box::new(|| {})).is_err());
    }
}
