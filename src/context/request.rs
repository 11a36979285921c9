//! Request facade view.
use bytes::{Bytes, BytesMut};

use crate::{
    body::Body,
    features::{
        Features,
        cookies::RequestCookiesFeature,
        form::{FormFeature, has_form_content_type},
        lifetime::{CancelSignal, Lifetime},
        query::{QueryFeature, parse_query, serialize_query},
        request::RequestHead,
    },
    cookie::parse_cookies,
    form::{
        BodyFormReader, FormCollection, FormError, FormErrorKind, FormOptions, MULTIPART,
        URLENCODED, boundary, media_type, parse_multipart,
    },
    http::{Method, Version, standard},
    values::{ValueMap, Values},
};

use super::RequestState;

/// Request view over the feature registry.
///
/// Typed accessors resolve the transport capability on demand; the parsed
/// query, cookie, and form views are cached in the registry and recomputed
/// only when their raw source value changes.
#[derive(Debug)]
pub struct Request<'a> {
    features: &'a mut Features,
    state: &'a mut RequestState,
    options: &'a FormOptions,
}

impl<'a> Request<'a> {
    pub(crate) fn new(
        features: &'a mut Features,
        state: &'a mut RequestState,
        options: &'a FormOptions,
    ) -> Self {
        Self {
            features,
            state,
            options,
        }
    }

    fn head(&mut self) -> &RequestHead {
        self.state
            .head
            .fetch_or_insert(self.features, |_| RequestHead::new())
    }

    fn head_mut(&mut self) -> &mut RequestHead {
        self.state
            .head
            .fetch_or_insert(self.features, |_| RequestHead::new())
    }

    // ===== Request line =====

    /// Returns the request method.
    pub fn method(&mut self) -> Method {
        self.head().method
    }

    /// Replace the request method.
    pub fn set_method(&mut self, method: Method) {
        self.head_mut().method = method;
    }

    /// Returns the request scheme.
    pub fn scheme(&mut self) -> &str {
        &self.head().scheme
    }

    /// Replace the request scheme.
    pub fn set_scheme(&mut self, scheme: impl Into<String>) {
        self.head_mut().scheme = scheme.into();
    }

    /// Returns `true` when the scheme is `https`.
    pub fn is_https(&mut self) -> bool {
        self.head().scheme.eq_ignore_ascii_case(standard::HTTPS)
    }

    /// Set the scheme to `https` or `http`.
    pub fn set_https(&mut self, https: bool) {
        self.set_scheme(if https { standard::HTTPS } else { standard::HTTP });
    }

    /// Returns the mount prefix owned by the host, empty at the root.
    pub fn path_base(&mut self) -> &str {
        &self.head().path_base
    }

    /// Replace the mount prefix.
    pub fn set_path_base(&mut self, path_base: impl Into<String>) {
        self.head_mut().path_base = path_base.into();
    }

    /// Returns the request path below the mount prefix.
    pub fn path(&mut self) -> &str {
        &self.head().path
    }

    /// Replace the request path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.head_mut().path = path.into();
    }

    /// Returns the raw query string without the leading `?`.
    pub fn query_string(&mut self) -> &str {
        &self.head().query
    }

    /// Replace the raw query string.
    pub fn set_query_string(&mut self, query: impl Into<String>) {
        self.head_mut().query = query.into();
    }

    /// Returns the protocol version.
    pub fn version(&mut self) -> Version {
        self.head().version
    }

    /// Replace the protocol version.
    pub fn set_version(&mut self, version: Version) {
        self.head_mut().version = version;
    }

    // ===== Headers =====

    /// Returns the request headers.
    pub fn headers(&mut self) -> &ValueMap {
        &self.head().headers
    }

    /// Returns the request headers mutably.
    pub fn headers_mut(&mut self) -> &mut ValueMap {
        &mut self.head_mut().headers
    }

    /// Returns the `Host` header value, if present.
    pub fn host(&mut self) -> Option<&str> {
        self.head().headers.first(standard::HOST)
    }

    /// Replace the `Host` header.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.head_mut().headers.insert(standard::HOST, host.into());
    }

    /// Returns the `Content-Type` header value, if present.
    pub fn content_type(&mut self) -> Option<&str> {
        self.head().headers.first(standard::CONTENT_TYPE)
    }

    /// Replace the `Content-Type` header.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.head_mut()
            .headers
            .insert(standard::CONTENT_TYPE, content_type.into());
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
    pub fn set_content_length(&mut self, length: Option<u64>) {
        let headers = &mut self.head_mut().headers;
        match length {
            Some(length) => {
                let mut buf = itoa::Buffer::new();
                headers.insert(standard::CONTENT_LENGTH, buf.format(length));
            }
            None => {
                headers.remove(standard::CONTENT_LENGTH);
            }
        }
    }

    // ===== Body =====

    /// Returns the request body mutably.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.head_mut().body
    }

    /// Take the request body, leaving an empty one.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.head_mut().body)
    }

    // ===== Query =====

    /// Returns the parsed query values.
    ///
    /// Parsed lazily and cached; re-parsed only when the raw query string no
    /// longer compares equal to the one the cache was computed from.
    pub fn query(&mut self) -> &ValueMap {
        let stale = match (
            self.features.get::<QueryFeature>(),
            self.features.get::<RequestHead>(),
        ) {
            (Some(query), Some(head)) => query.is_stale(&head.query),
            (Some(query), None) => query.is_stale(""),
            _ => true,
        };
        if stale {
            let raw = self.head().query.clone();
            let parsed = parse_query(&raw);
            let query = self
                .state
                .query
                .fetch_or_insert(self.features, |_| QueryFeature::new());
            query.store(raw, parsed);
        }
        self.state
            .query
            .fetch_or_insert(self.features, |_| QueryFeature::new())
            .values_mut()
            .get_or_insert_with(ValueMap::new)
    }

    /// Replace the query values.
    ///
    /// The mapping is serialized into canonical `k=v&k=v` form, written back
    /// as the raw query string, and cached as authoritative without a
    /// re-parse.
    pub fn set_query(&mut self, values: ValueMap) {
        let serialized = serialize_query(&values);
        self.head_mut().query = serialized.clone();
        self.state
            .query
            .fetch_or_insert(self.features, |_| QueryFeature::new())
            .store(serialized, values);
    }

    // ===== Cookies =====

    /// Returns the parsed request cookies.
    ///
    /// Parsed lazily from the `Cookie` header lines and cached until the
    /// header value changes; malformed segments are dropped.
    pub fn cookies(&mut self) -> &ValueMap {
        let stale = match (
            self.features.get::<RequestCookiesFeature>(),
            self.features.get::<RequestHead>(),
        ) {
            (Some(cookies), Some(head)) => {
                cookies.is_stale(head.headers.value(standard::COOKIE))
            }
            (Some(cookies), None) => cookies.is_stale(&Values::EMPTY),
            _ => true,
        };
        if stale {
            let raw = self.head().headers.value(standard::COOKIE).clone();
            let parsed = parse_cookies(raw.iter());
            let cookies = self
                .state
                .cookies
                .fetch_or_insert(self.features, |_| RequestCookiesFeature::new());
            cookies.store(raw, parsed);
        }
        self.state
            .cookies
            .fetch_or_insert(self.features, |_| RequestCookiesFeature::new())
            .cookies_mut()
            .get_or_insert_with(ValueMap::new)
    }

    /// Replace the parsed cookies for the rest of the request.
    ///
    /// The raw `Cookie` header is left untouched; a later header change
    /// still triggers a re-parse that overwrites this value.
    pub fn set_cookies(&mut self, values: ValueMap) {
        let raw = self.head().headers.value(standard::COOKIE).clone();
        self.state
            .cookies
            .fetch_or_insert(self.features, |_| RequestCookiesFeature::new())
            .store(raw, values);
    }

    // ===== Form =====

    /// Returns `true` if the `Content-Type` media type is a supported form
    /// media type.
    pub fn has_form_content_type(&mut self) -> bool {
        has_form_content_type(&self.head().headers)
    }

    /// Returns the form collection when it has already been read.
    pub fn form(&mut self) -> Option<&FormCollection> {
        self.state
            .form
            .fetch(self.features)
            .and_then(|feature| feature.form())
    }

    /// Replace the memoized form collection.
    pub fn set_form(&mut self, form: FormCollection) {
        self.state
            .form
            .fetch_or_insert(self.features, |_| FormFeature::new())
            .set(form);
    }

    /// Read and decode the form body.
    ///
    /// The result is memoized: the first successful read consumes the body
    /// and every later call returns the same collection. A failed or
    /// cancelled read leaves nothing memoized, so a retry re-reads.
    ///
    /// # Errors
    ///
    /// Returns error when the content type is not a form media type, a
    /// configured limit is exceeded, the lifetime signal is triggered
    /// mid-read, or the body read fails.
    pub async fn read_form(&mut self) -> Result<&FormCollection, FormError> {
        let cached = self
            .features
            .get::<FormFeature>()
            .is_some_and(|feature| feature.form().is_some());
        if !cached {
            let collection = self.decode_form().await?;
            self.state
                .form
                .fetch_or_insert(self.features, |_| FormFeature::new())
                .set(collection);
        }
        Ok(self
            .state
            .form
            .fetch_or_insert(self.features, |_| FormFeature::new())
            .form_slot()
            .get_or_insert_with(FormCollection::default))
    }

    async fn decode_form(&mut self) -> Result<FormCollection, FormError> {
        let Some(content_type) = self.content_type().map(str::to_owned) else {
            return Err(FormErrorKind::ContentType.into());
        };
        let media = media_type(&content_type).to_ascii_lowercase();
        let cancel = self
            .features
            .get::<Lifetime>()
            .map(Lifetime::aborted);

        if media == URLENCODED {
            let mut body = self.take_body();
            let fields = BodyFormReader::read_form(&mut body, self.options, cancel).await?;
            Ok(FormCollection::new(fields))
        } else if media == MULTIPART {
            let boundary = boundary(&content_type)
                .ok_or(FormErrorKind::Multipart("missing boundary parameter"))?
                .to_owned();
            let body = self.take_body();
            let bytes =
                collect_limited(body, self.options.multipart_body_length_limit, cancel).await?;
            let (fields, files) =
                parse_multipart(&bytes, &boundary, self.options.value_count_limit)?;
            Ok(FormCollection::with_files(fields, files))
        } else {
            Err(FormErrorKind::ContentType.into())
        }
    }

    /// Returns the cancellation signal of the request lifetime capability,
    /// if one is installed.
    pub fn aborted(&mut self) -> Option<CancelSignal> {
        self.features.get::<Lifetime>().map(Lifetime::aborted)
    }
}

/// Buffer the whole body, observing the size limit and the cancellation
/// signal between reads.
async fn collect_limited(
    mut body: Body,
    limit: u64,
    cancel: Option<CancelSignal>,
) -> Result<Bytes, FormError> {
    const CHUNK: usize = 8 * 1024;

    let mut buffer = BytesMut::new();
    loop {
        if let Some(cancel) = &cancel
            && cancel.is_cancelled()
        {
            return Err(FormErrorKind::Cancelled.into());
        }

        let read = std::future::poll_fn(|cx| body.poll_read_buf(&mut buffer, CHUNK, cx)).await?;
        if read == 0 {
            return Ok(buffer.freeze());
        }
        if buffer.len() as u64 > limit {
            return Err(FormErrorKind::BodyLengthLimit(limit).into());
        }
    }
}
