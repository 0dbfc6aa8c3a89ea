//! Error taxonomy.
//!
//! Two families, kept apart because they surface at different times:
//!
//! - [`Error`] is produced while a request is in flight. The router catches it
//!   once, centrally, and hands it to its `on_error` handler.
//! - [`ConfigError`] is produced while a [`Router`](crate::Router) is being
//!   constructed. No router exists when it is returned, so it is a startup
//!   failure for the caller, never a per-request one.

use std::fmt;

use thiserror::Error;

use crate::method::Method;
use crate::schema::Issue;

/// Boxed, thread-safe error used for opaque handler and middleware faults.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type flowing through a route's middleware chain.
#[derive(Debug, Error)]
pub enum Error {
    /// The request body or query did not satisfy the route's schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Any other failure raised by a handler or middleware, carried verbatim.
    #[error(transparent)]
    Fault(BoxError),

    /// A handler or middleware panicked; holds the panic payload when it was a string.
    #[error("request handler panicked: {0}")]
    Panic(String),
}

impl Error {
    /// Wraps an arbitrary error as an opaque fault.
    pub fn fault(err: impl Into<BoxError>) -> Self {
        Self::Fault(err.into())
    }

    /// Returns the validation failure, if that is what this is.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// Downcasts a [`Fault`](Error::Fault) back to the concrete error the
    /// handler or middleware raised.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Fault(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<BoxError> for Error {
    fn from(err: BoxError) -> Self {
        Self::Fault(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::fault(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::fault(err)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self::fault(msg)
    }
}

impl From<&'static str> for Error {
    fn from(msg: &'static str) -> Self {
        Self::fault(msg)
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Which part of the request failed to parse.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    Body,
    Query,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Body => "body",
            Self::Query => "query",
        })
    }
}

/// A schema rejected the request body or query.
///
/// The issue list is passed through exactly as the schema produced it.
#[derive(Clone, Debug, Error)]
#[error("Failed to parse {target}")]
pub struct ValidationError {
    target: Target,
    issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(target: Target, issues: Vec<Issue>) -> Self {
        Self { target, issues }
    }

    pub fn target(&self) -> Target { self.target }
    pub fn issues(&self) -> &[Issue] { &self.issues }

    /// Human-readable context, e.g. `"Failed to parse body"`.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

// ── Construction ─────────────────────────────────────────────────────────────

/// A router could not be built from the supplied method map.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    #[error("unsupported method `{0}`, expected one of GET, POST, PUT, DELETE, PATCH, OPTIONS, TRACE")]
    UnsupportedMethod(String),

    #[error("method `{0}` is registered more than once")]
    DuplicateMethod(Method),
}
