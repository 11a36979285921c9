//! Response facade view.
use crate::{
    body::ResponseBody,
    features::{
        Features,
        cookies::ResponseCookies,
        response::ResponseHead,
    },
    http::{StatusCode, Version, standard},
    values::ValueMap,
};

use super::{ContextError, ContextErrorKind, ResponseState};

/// Response view over the feature registry.
///
/// Status and header mutation is rejected once the response has started;
/// body writes stay open.
#[derive(Debug)]
pub struct Response<'a> {
    features: &'a mut Features,
    state: &'a mut ResponseState,
}

impl<'a> Response<'a> {
    pub(crate) fn new(features: &'a mut Features, state: &'a mut ResponseState) -> Self {
        Self { features, state }
    }

    fn head(&mut self) -> &ResponseHead {
        self.state
            .head
            .fetch_or_insert(self.features, |_| ResponseHead::new())
    }

    fn head_mut(&mut self) -> &mut ResponseHead {
        self.state
            .head
            .fetch_or_insert(self.features, |_| ResponseHead::new())
    }

    fn head_unstarted(&mut self) -> Result<&mut ResponseHead, ContextError> {
        let head = self.head_mut();
        if head.has_started() {
            return Err(ContextErrorKind::ResponseStarted.into());
        }
        Ok(head)
    }

    // ===== Status line =====

    /// Returns the status code.
    pub fn status(&mut self) -> StatusCode {
        self.head().status
    }

    /// Replace the status code.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn set_status(&mut self, status: StatusCode) -> Result<(), ContextError> {
        self.head_unstarted()?.status = status;
        Ok(())
    }

    /// Returns the reason phrase override, if set.
    pub fn reason(&mut self) -> Option<&str> {
        self.head().reason.as_deref()
    }

    /// Replace the reason phrase.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn set_reason(&mut self, reason: impl Into<String>) -> Result<(), ContextError> {
        self.head_unstarted()?.reason = Some(reason.into());
        Ok(())
    }

    /// Returns the protocol version.
    pub fn version(&mut self) -> Version {
        self.head().version
    }

    // ===== Headers =====

    /// Returns the response headers.
    pub fn headers(&mut self) -> &ValueMap {
        &self.head().headers
    }

    /// Returns the response headers mutably.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn headers_mut(&mut self) -> Result<&mut ValueMap, ContextError> {
        Ok(&mut self.head_unstarted()?.headers)
    }

    /// Returns the `Content-Type` header value, if present.
    pub fn content_type(&mut self) -> Option<&str> {
        self.head().headers.first(standard::CONTENT_TYPE)
    }

    /// Replace the `Content-Type` header.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) -> Result<(), ContextError> {
        self.head_unstarted()?
            .headers
            .insert(standard::CONTENT_TYPE, content_type.into());
        Ok(())
    }

    /// Returns the parsed `Content-Length` header value, if present and
    /// numeric.
    pub fn content_length(&mut self) -> Option<u64> {
        self.head()
            .headers
            .first(standard::CONTENT_LENGTH)?
            .trim()
            .parse()
            .ok()
    }

    /// Replace or remove the `Content-Length` header.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn set_content_length(&mut self, length: Option<u64>) -> Result<(), ContextError> {
        let headers = &mut self.head_unstarted()?.headers;
        match length {
            Some(length) => {
                let mut buf = itoa::Buffer::new();
                headers.insert(standard::CONTENT_LENGTH, buf.format(length));
            }
            None => {
                headers.remove(standard::CONTENT_LENGTH);
            }
        }
        Ok(())
    }

    /// Returns write access to the `Set-Cookie` headers.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn cookies(&mut self) -> Result<ResponseCookies<'_>, ContextError> {
        Ok(ResponseCookies::new(&mut self.head_unstarted()?.headers))
    }

    /// Redirect to `location` with `302 Found`, or `301 Moved Permanently`.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn redirect(&mut self, location: &str, permanent: bool) -> Result<(), ContextError> {
        let head = self.head_unstarted()?;
        head.status = if permanent {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::FOUND
        };
        head.headers.insert(standard::LOCATION, location);
        Ok(())
    }

    // ===== Body =====

    /// Returns the response body.
    pub fn body(&mut self) -> &ResponseBody {
        &self.head().body
    }

    /// Returns the response body mutably.
    ///
    /// Body writes stay open after the response has started.
    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.head_mut().body
    }

    /// Append bytes to the body write buffer, starting the response first.
    pub fn write(&mut self, data: &[u8]) {
        let head = self.head_mut();
        head.start();
        head.body.write(data);
    }

    // ===== Lifecycle =====

    /// Returns `true` once the response head has been handed to the
    /// transport.
    pub fn has_started(&mut self) -> bool {
        self.head().has_started()
    }

    /// Mark the response as started, running start callbacks first.
    pub fn start(&mut self) {
        self.head_mut().start();
    }

    /// Run the completion callbacks.
    pub fn complete(&mut self) {
        self.head_mut().complete();
    }

    /// Register a callback to run just before the response starts.
    ///
    /// # Errors
    ///
    /// Returns error when the response has already started.
    pub fn on_starting(
        &mut self,
        callback: Box<dyn FnOnce() + Send + Sync>,
    ) -> Result<(), ContextError> {
        self.head_mut().on_starting(callback).map_err(Into::into)
    }

    /// Register a callback to run after the response completes.
    pub fn on_completed(&mut self, callback: Box<dyn FnOnce() + Send + Sync>) {
        self.head_mut().on_completed(callback);
    }
}
