use bytes::Bytes;
use std::collections::HashMap;

use crate::{
    features::{
        Features,
        auth::Principal,
        query::QueryFeature,
        request::RequestHead,
        session::Session,
    },
    form::{FormErrorKind, FormOptions},
    http::{Method, StatusCode},
    values::ValueMap,
};

use super::{ContextErrorKind, ContextFactory, HttpContext};

fn transport_features(query: &str, headers: &[(&str, &str)], body: &'static [u8]) -> Features {
    let mut head = RequestHead::new();
    head.method = Method::POST;
    head.query = query.to_owned();
    for (name, value) in headers {
        head.headers.append(*name, *value);
    }
    head.body = crate::body::Body::from_reader(Bytes::new(), Bytes::from_static(body));

    let mut features = Features::new();
    features.set(head);
    features
}

// ===== Identity and laziness =====

#[test]
fn derived_state_is_stable_across_accesses() {
    let mut ctx = HttpContext::new();
    ctx.request().set_query_string("a=1");

    let first = ctx.request().query() as *const ValueMap;
    let second = ctx.request().query() as *const ValueMap;
    assert_eq!(first, second);

    // reinitialization drops the derived state
    ctx.initialize(transport_features("x=9", &[], b""));
    let mut request = ctx.request();
    assert!(request.query().get("a").is_none());
    assert_eq!(request.query().first("x"), Some("9"));
}

#[test]
fn query_round_trip_through_facade() {
    let mut ctx = HttpContext::new();
    let mut request = ctx.request();
    request.set_query_string("a=1&a=2&b=");

    {
        let query = request.query();
        assert_eq!(query.value("a").iter().collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(query.first("b"), Some(""));
    }

    // serializing the parsed mapping back is canonical and idempotent
    let values = request.query().clone();
    request.set_query(values);
    assert_eq!(request.query_string(), "a=1&a=2&b=");
    assert_eq!(request.query().value("a").len(), 2);
}

#[test]
fn query_reparses_when_raw_changes() {
    let mut ctx = HttpContext::new();
    let mut request = ctx.request();

    request.set_query_string("a=1");
    assert_eq!(request.query().first("a"), Some("1"));

    request.set_query_string("b=2");
    let query = request.query();
    assert!(query.get("a").is_none());
    assert_eq!(query.first("b"), Some("2"));
}

#[test]
fn substituted_query_feature_is_authoritative() {
    let mut ctx = HttpContext::new();
    ctx.request().set_query_string("raw=1");

    let mut fixed = ValueMap::new();
    fixed.append("fixed", "yes");
    ctx.features_mut().set(QueryFeature::fixed(fixed));

    let mut request = ctx.request();
    assert_eq!(request.query().first("fixed"), Some("yes"));
    assert!(request.query().get("raw").is_none());
}

#[test]
fn replaced_head_instance_is_observed() {
    let mut ctx = HttpContext::new();
    ctx.request().set_path("/old");

    let mut head = RequestHead::new();
    head.path = "/new".to_owned();
    ctx.features_mut().set(head);

    assert_eq!(ctx.request().path(), "/new");
}

// ===== Cookies =====

#[test]
fn cookies_parse_and_skip_malformed() {
    let mut ctx =
        HttpContext::with_features(transport_features("", &[("cookie", "a=1; bad; b=2")], b""));
    let mut request = ctx.request();

    let cookies = request.cookies();
    assert_eq!(cookies.first("a"), Some("1"));
    assert_eq!(cookies.first("b"), Some("2"));
    assert_eq!(cookies.len(), 2);
}

#[test]
fn cookies_reparse_on_header_change() {
    let mut ctx =
        HttpContext::with_features(transport_features("", &[("cookie", "a=1")], b""));

    assert_eq!(ctx.request().cookies().first("a"), Some("1"));

    ctx.request()
        .headers_mut()
        .insert("cookie", "c=3");
    let mut request = ctx.request();
    let cookies = request.cookies();
    assert!(cookies.get("a").is_none());
    assert_eq!(cookies.first("c"), Some("3"));
}

// ===== Session and auth =====

#[derive(Default)]
struct MemSession {
    store: HashMap<String, Vec<u8>>,
}

impl Session for MemSession {
    fn id(&self) -> &str {
        "mem"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.store.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.store.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) {
        self.store.remove(key);
    }

    fn clear(&mut self) {
        self.store.clear();
    }
}

#[test]
fn session_requires_configuration() {
    let mut ctx = HttpContext::new();
    let err = ctx.session().map(|_| ()).unwrap_err();
    assert!(matches!(
        err.kind(),
        ContextErrorKind::SessionNotConfigured
    ));

    ctx.set_session(Box::new(MemSession::default()));
    let session = ctx.session().unwrap();
    session.set("k", b"v".to_vec());
    assert_eq!(session.get("k"), Some(b"v".to_vec()));
}

#[test]
fn user_defaults_to_anonymous() {
    let mut ctx = HttpContext::new();
    assert!(!ctx.user().is_authenticated());

    ctx.set_user(Principal::named("jo"));
    assert_eq!(ctx.user().name(), Some("jo"));
}

// ===== Lifetime and identifier =====

#[test]
fn abort_triggers_signal() {
    let mut ctx = HttpContext::new();
    let signal = ctx.aborted();
    assert!(!signal.is_cancelled());

    ctx.abort();
    assert!(signal.is_cancelled());
}

#[test]
fn trace_identifier_generates_and_sticks() {
    let mut ctx = HttpContext::new();
    let id = ctx.trace_identifier().to_owned();
    assert_eq!(id.len(), 13);
    assert_eq!(ctx.trace_identifier(), id);

    ctx.set_trace_identifier("custom");
    assert_eq!(ctx.trace_identifier(), "custom");
}

// ===== Response =====

#[test]
fn response_head_freezes_after_start() {
    let mut ctx = HttpContext::new();
    let mut response = ctx.response();

    response.set_status(StatusCode::CREATED).unwrap();
    response
        .cookies()
        .unwrap()
        .append("id", "1");
    response.write(b"hello");

    assert!(response.has_started());
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.body().buffered(), b"hello");

    let err = response.set_status(StatusCode::OK).unwrap_err();
    assert!(matches!(err.kind(), ContextErrorKind::ResponseStarted));
    assert!(response.headers_mut().is_err());
    assert!(response.cookies().is_err());

    // body writes stay open
    response.write(b" world");
    assert_eq!(response.body().buffered(), b"hello world");
}

#[test]
fn redirect_sets_status_and_location() {
    let mut ctx = HttpContext::new();
    let mut response = ctx.response();

    response.redirect("/login", false).unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().first("location"), Some("/login"));
}

// ===== Form =====

#[tokio::test]
async fn read_form_decodes_and_memoizes() {
    let features = transport_features(
        "",
        &[("content-type", "application/x-www-form-urlencoded")],
        b"name=John+Doe&city=New%20York",
    );
    let mut ctx = HttpContext::with_features(features);
    let mut request = ctx.request();

    assert!(request.has_form_content_type());
    {
        let form = request.read_form().await.unwrap();
        assert_eq!(form.value("name").first(), Some("John Doe"));
        assert_eq!(form.value("city").first(), Some("New York"));
    }

    // the body is consumed, yet the collection stays memoized
    let form = request.read_form().await.unwrap();
    assert_eq!(form.value("name").first(), Some("John Doe"));
}

#[tokio::test]
async fn read_form_rejects_other_content_types() {
    let features = transport_features("", &[("content-type", "application/json")], b"{}");
    let mut ctx = HttpContext::with_features(features);
    let mut request = ctx.request();

    assert!(!request.has_form_content_type());
    let err = request.read_form().await.unwrap_err();
    assert!(matches!(err.kind(), FormErrorKind::ContentType));
}

#[tokio::test]
async fn read_form_multipart() {
    let body: &[u8] = b"--B\r\n\
        content-disposition: form-data; name=\"title\"\r\n\
        \r\n\
        hi\r\n\
        --B\r\n\
        content-disposition: form-data; name=\"doc\"; filename=\"d.txt\"\r\n\
        \r\n\
        data\r\n\
        --B--\r\n";
    let features = transport_features(
        "",
        &[("content-type", "multipart/form-data; boundary=B")],
        body,
    );
    let mut ctx = HttpContext::with_features(features);
    let mut request = ctx.request();

    let form = request.read_form().await.unwrap();
    assert_eq!(form.value("title").first(), Some("hi"));
    assert_eq!(form.files().len(), 1);
    assert_eq!(form.files()[0].filename(), "d.txt");
    assert_eq!(form.files()[0].content().as_ref(), b"data");
}

#[tokio::test]
async fn cancelled_form_read_is_distinct_and_retryable() {
    let features = transport_features(
        "",
        &[("content-type", "application/x-www-form-urlencoded")],
        b"a=1",
    );
    let mut ctx = HttpContext::with_features(features);
    ctx.abort();

    let mut request = ctx.request();
    let err = request.read_form().await.unwrap_err();
    assert!(err.is_cancelled());

    // nothing was memoized by the failed read
    assert!(request.form().is_none());
}

// ===== Pooling =====

#[test]
fn factory_recycles_and_resets() {
    let factory = ContextFactory::new();

    let mut ctx = factory.create(transport_features(
        "a=1",
        &[("cookie", "sid=first")],
        b"",
    ));
    assert_eq!(ctx.request().query().first("a"), Some("1"));
    assert_eq!(ctx.request().cookies().first("sid"), Some("first"));
    ctx.items().insert("marker", 1u32);
    let first_trace = ctx.trace_identifier().to_owned();

    factory.dispose(ctx);
    assert_eq!(factory.pooled(), 1);

    // the recycled instance observes only the new registry's data
    let mut ctx = factory.create(transport_features(
        "b=2",
        &[("cookie", "sid=second")],
        b"",
    ));
    assert_eq!(factory.pooled(), 0);

    let mut request = ctx.request();
    assert!(request.query().get("a").is_none());
    assert_eq!(request.query().first("b"), Some("2"));
    assert_eq!(request.cookies().first("sid"), Some("second"));
    drop(request);

    assert!(ctx.items().get::<u32>("marker").is_none());
    assert_ne!(ctx.trace_identifier(), first_trace);
}

#[test]
fn dispose_is_complete_even_after_response_started() {
    let factory = ContextFactory::new();

    let mut ctx = factory.create(transport_features("", &[], b""));
    ctx.response().write(b"data");
    assert!(ctx.response().has_started());
    factory.dispose(ctx);

    let mut ctx = factory.create(transport_features("", &[], b""));
    assert!(!ctx.response().has_started());
    assert!(ctx.response().body().buffered().is_empty());
    assert_eq!(ctx.response().status(), StatusCode::OK);
}

#[tokio::test]
async fn form_options_flow_from_factory() {
    let factory = ContextFactory::with_options(FormOptions {
        value_count_limit: 1,
        ..FormOptions::default()
    });

    let mut ctx = factory.create(transport_features(
        "",
        &[("content-type", "application/x-www-form-urlencoded")],
        b"a=1&b=2",
    ));
    let err = ctx.request().read_form().await.unwrap_err();
    assert!(matches!(err.kind(), FormErrorKind::ValueCountLimit(1)));
}
