//! Incoming request handle.

use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Extensions;
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// An incoming request, as seen by middleware and handlers.
///
/// Cloning is cheap: every clone points at the same request. The handle is
/// owned by one in-flight dispatch and should not be kept after it returns.
#[derive(Clone)]
pub struct Request {
    inner: Arc<Inner>,
}

struct Inner {
    method: String,
    path: String,
    headers: HeaderMap,
    body: Value,
    query: Value,
    extensions: RwLock<Extensions>,
}

impl Request {
    /// Starts building a request. Hosts use this to hand requests to a router;
    /// tests use it to fabricate them.
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: "GET".to_owned(),
            path: "/".to_owned(),
            headers: HeaderMap::new(),
            body: Value::Null,
            query: Map::new(),
        }
    }

    pub fn method(&self) -> &str { &self.inner.method }
    pub fn path(&self) -> &str { &self.inner.path }
    pub fn headers(&self) -> &HeaderMap { &self.inner.headers }

    /// The raw, undecoded body.
    pub fn body(&self) -> &Value { &self.inner.body }

    /// The raw query as a JSON object. Values are strings, or arrays of
    /// strings for keys that appeared more than once.
    pub fn query(&self) -> &Value { &self.inner.query }

    /// Header lookup. Names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Stores a typed value for later middleware or the handler to read.
    /// Replaces any previous value of the same type.
    pub fn insert_extension<T: Clone + Send + Sync + 'static>(&self, value: T) {
        self.inner.extensions.write().insert(value);
    }

    /// Returns a clone of the stored value of type `T`, if any.
    pub fn extension<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.inner.extensions.read().get::<T>().cloned()
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.inner.method)
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

// ── RequestBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Request`]. Obtain via [`Request::builder()`].
pub struct RequestBuilder {
    method: String,
    path: String,
    headers: HeaderMap,
    body: Value,
    query: Map<String, Value>,
}

impl RequestBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Adds one query pair. A repeated key turns the entry into an array,
    /// preserving arrival order.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        push_query(&mut self.query, key.into(), value.into());
        self
    }

    pub fn build(self) -> Request {
        Request {
            inner: Arc::new(Inner {
                method: self.method,
                path: self.path,
                headers: self.headers,
                body: self.body,
                query: Value::Object(self.query),
                extensions: RwLock::new(Extensions::new()),
            }),
        }
    }
}

fn push_query(query: &mut Map<String, Value>, key: String, value: String) {
    match query.get_mut(&key) {
        None => {
            query.insert(key, Value::String(value));
        }
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
    }
}
