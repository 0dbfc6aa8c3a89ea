//! Schema adapters.
//!
//! A route never validates anything itself. It hands the raw body and query to
//! a [`Schema`] and gets back either decoded data or a list of [`Issue`]s. Any
//! validation library fits behind the one-method trait; this module ships the
//! few adapters the crate needs on its own:
//!
//! - [`Any`] passes the raw value through untouched (the route default).
//! - [`Typed`] decodes through serde into any `DeserializeOwned` type.
//! - [`from_fn`] wraps an async closure, for rules that must await something.
//! - [`SchemaExt::refine`] bolts a post-decode check onto any adapter.
//!
//! Validation failures are values, not errors: `attempt_parse` never fails in
//! the `Result` sense.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Issue ────────────────────────────────────────────────────────────────────

/// One step in the path to an offending value: an object key or an array index.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self { Self::Key(key.to_owned()) }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self { Self::Key(key) }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self { Self::Index(index) }
}

/// A structured description of one validation failure.
///
/// The router never interprets issues; it serialises them verbatim into the
/// `errors` array of a 400 response.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub message: String,
    pub code: String,
}

impl Issue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: Vec::new(), message: message.into(), code: code.into() }
    }

    /// Appends a path segment. Returns `self` for chaining.
    pub fn at(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.push(segment.into());
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{} ({})", self.message, self.code);
        }
        let path = self.path.iter()
            .map(|s| match s {
                PathSegment::Key(k) => k.clone(),
                PathSegment::Index(i) => i.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{path}: {} ({})", self.message, self.code)
    }
}

// ── ParseResult ──────────────────────────────────────────────────────────────

/// Outcome of [`Schema::attempt_parse`].
#[derive(Clone, Debug, PartialEq)]
pub enum ParseResult<T> {
    Success { data: T },
    Failure { issues: Vec<Issue> },
}

impl<T> ParseResult<T> {
    pub fn success(data: T) -> Self { Self::Success { data } }
    pub fn failure(issues: Vec<Issue>) -> Self { Self::Failure { issues } }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn into_result(self) -> Result<T, Vec<Issue>> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Failure { issues } => Err(issues),
        }
    }
}

impl<T> From<Result<T, Vec<Issue>>> for ParseResult<T> {
    fn from(res: Result<T, Vec<Issue>>) -> Self {
        match res {
            Ok(data) => Self::Success { data },
            Err(issues) => Self::Failure { issues },
        }
    }
}

// ── Schema trait ─────────────────────────────────────────────────────────────

/// Asynchronous validation and decoding of one raw request value.
///
/// Implementations are shared by every in-flight request on a route, so they
/// must be `Send + Sync` and must not keep per-request state.
pub trait Schema: Send + Sync + 'static {
    /// The decoded type handed to the route handler.
    type Output: Send + 'static;

    fn attempt_parse(&self, value: Value) -> impl Future<Output = ParseResult<Self::Output>> + Send;
}

/// Accepts any value and returns it unchanged. No coercion.
#[derive(Clone, Copy, Debug, Default)]
pub struct Any;

impl Schema for Any {
    type Output = Value;

    async fn attempt_parse(&self, value: Value) -> ParseResult<Value> {
        ParseResult::success(value)
    }
}

/// Decodes the raw value into `T` with serde.
///
/// Query values always arrive as strings (or arrays of strings), so numeric
/// query fields need a `T` that deserialises from strings.
pub struct Typed<T>(PhantomData<fn() -> T>);

impl<T> Typed<T> {
    pub fn new() -> Self { Self(PhantomData) }
}

impl<T> Default for Typed<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self { Self::new() }
}

impl<T> Schema for Typed<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    async fn attempt_parse(&self, value: Value) -> ParseResult<T> {
        match serde_json::from_value::<T>(value) {
            Ok(data) => ParseResult::success(data),
            Err(e) => ParseResult::failure(vec![Issue::new("invalid_type", e.to_string())]),
        }
    }
}

/// Adapter built by [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

/// Builds a schema from an async closure.
///
/// ```rust
/// use wicket::schema::{self, Issue, ParseResult};
/// use serde_json::Value;
///
/// let non_empty = schema::from_fn(|value: Value| async move {
///     match value.as_str() {
///         Some(s) if !s.is_empty() => ParseResult::success(s.to_owned()),
///         _ => ParseResult::failure(vec![Issue::new("too_small", "expected a non-empty string")]),
///     }
/// });
/// # let _ = non_empty;
/// ```
pub fn from_fn<F, Fut, T>(f: F) -> FromFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ParseResult<T>> + Send,
    T: Send + 'static,
{
    FromFn { f }
}

impl<F, Fut, T> Schema for FromFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ParseResult<T>> + Send,
    T: Send + 'static,
{
    type Output = T;

    fn attempt_parse(&self, value: Value) -> impl Future<Output = ParseResult<T>> + Send {
        (self.f)(value)
    }
}

// ── Combinators ──────────────────────────────────────────────────────────────

/// Extension methods available on every [`Schema`].
pub trait SchemaExt: Schema + Sized {
    /// Runs `check` on successfully decoded data. An `Err` turns the result
    /// into a failure carrying that single issue.
    fn refine<F>(self, check: F) -> Refine<Self, F>
    where
        F: Fn(&Self::Output) -> Result<(), Issue> + Send + Sync + 'static,
    {
        Refine { inner: self, check }
    }
}

impl<S: Schema> SchemaExt for S {}

/// Schema returned by [`SchemaExt::refine`].
pub struct Refine<S, F> {
    inner: S,
    check: F,
}

impl<S, F> Schema for Refine<S, F>
where
    S: Schema,
    F: Fn(&S::Output) -> Result<(), Issue> + Send + Sync + 'static,
{
    type Output = S::Output;

    async fn attempt_parse(&self, value: Value) -> ParseResult<S::Output> {
        match self.inner.attempt_parse(value).await {
            ParseResult::Success { data } => match (self.check)(&data) {
                Ok(()) => ParseResult::success(data),
                Err(issue) => ParseResult::failure(vec![issue]),
            },
            failure => failure,
        }
    }
}
