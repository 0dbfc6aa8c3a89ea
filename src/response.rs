//! Outgoing response handle and the [`IntoReply`] conversion trait.
//!
//! Middleware and handlers both write to the same [`Response`]: a middleware
//! can answer a request itself and never call `next`, a handler can write
//! directly and return `()`, or a handler can return a value and let the route
//! serialise it as JSON.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

// ── Response ─────────────────────────────────────────────────────────────────

/// Per-request response state.
///
/// Cloning is cheap: every clone writes to the same response. Nothing reaches
/// the wire until the host converts it with [`Response::into_http`].
///
/// ```rust
/// use http::StatusCode;
/// use wicket::Response;
///
/// let res = Response::new();
/// res.set_status(StatusCode::CREATED);
/// res.json(&serde_json::json!({ "id": 42 })).unwrap();
/// assert_eq!(res.status(), Some(StatusCode::CREATED));
/// ```
#[derive(Clone, Default)]
pub struct Response {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status set so far, if any. Renders as `200 OK` when unset.
    pub fn status(&self) -> Option<StatusCode> {
        self.state.lock().status
    }

    pub fn set_status(&self, status: StatusCode) -> &Self {
        self.state.lock().status = Some(status);
        self
    }

    /// Sets a header, replacing any existing value for `name`.
    pub fn set_header(&self, name: HeaderName, value: HeaderValue) -> &Self {
        self.state.lock().headers.insert(name, value);
        self
    }

    pub fn header(&self, name: &str) -> Option<HeaderValue> {
        self.state.lock().headers.get(name).cloned()
    }

    /// Writes a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(&self, body: impl Into<String>) {
        self.write(HeaderValue::from_static("text/plain; charset=utf-8"), Bytes::from(body.into()));
    }

    /// Serialises `value` and writes it as an `application/json` body.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), Error> {
        let bytes = serde_json::to_vec(value)?;
        self.write(HeaderValue::from_static("application/json"), Bytes::from(bytes));
        Ok(())
    }

    /// Writes a body with an explicit content type.
    pub fn bytes(&self, content_type: HeaderValue, body: impl Into<Bytes>) {
        self.write(content_type, body.into());
    }

    /// True once any body has been written.
    pub fn is_written(&self) -> bool {
        self.state.lock().body.is_some()
    }

    /// The body written so far.
    pub fn body(&self) -> Option<Bytes> {
        self.state.lock().body.clone()
    }

    /// The body parsed as JSON, if one was written and it parses.
    pub fn body_json(&self) -> Option<Value> {
        self.body().and_then(|b| serde_json::from_slice(&b).ok())
    }

    /// The body as UTF-8 text, if one was written and it decodes.
    pub fn body_text(&self) -> Option<String> {
        self.body().and_then(|b| String::from_utf8(b.to_vec()).ok())
    }

    /// Discards status, headers and body written so far.
    pub fn clear(&self) {
        *self.state.lock() = State::default();
    }

    /// Discards the status and body written so far, along with their
    /// `content-type`. Every other header stays.
    pub fn reset_body(&self) {
        let mut state = self.state.lock();
        state.status = None;
        state.body = None;
        state.headers.remove(header::CONTENT_TYPE);
    }

    /// Converts the accumulated state into an `http::Response` for the host.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let state = std::mem::take(&mut *self.state.lock());
        let mut res = http::Response::new(Full::new(state.body.unwrap_or_default()));
        *res.status_mut() = state.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = state.headers;
        res
    }

    fn write(&self, content_type: HeaderValue, body: Bytes) {
        let mut state = self.state.lock();
        state.headers.insert(header::CONTENT_TYPE, content_type);
        state.body = Some(body);
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Response")
            .field("status", &state.status)
            .field("headers", &state.headers)
            .field("body_len", &state.body.as_ref().map(Bytes::len))
            .finish()
    }
}

// ── Reply ────────────────────────────────────────────────────────────────────

/// What a handler produced, after normalisation.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// The handler wrote the response itself, or has nothing to send.
    Nothing,
    /// A value to serialise as the JSON body.
    Json(Value),
}

/// Wraps any `Serialize` value so a handler can return it directly.
#[derive(Clone, Debug)]
pub struct Json<T>(pub T);

/// Conversion of a handler's return value into a [`Reply`].
///
/// `()` and `None` both mean "nothing to write". Returning `Err` from a
/// handler routes the error to the router's `on_error` handler.
///
/// ```rust,ignore
/// route().build(|_| async { Json(User { id: 1 }) });          // 200 + JSON
/// route().build(|p| async move { p.response.text("hi"); });   // handler wrote it
/// route().build(|_| async { Err::<(), _>("nope") });          // on_error
/// ```
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, Error>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, Error> { Ok(self) }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Nothing) }
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Json(self)) }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, Error> {
        Ok(Reply::Json(serde_json::to_value(self.0)?))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, Error> {
        self.map_or(Ok(Reply::Nothing), IntoReply::into_reply)
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<Error>,
{
    fn into_reply(self) -> Result<Reply, Error> {
        self.map_err(Into::into)?.into_reply()
    }
}
