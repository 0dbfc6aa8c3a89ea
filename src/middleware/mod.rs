//! Middleware layer.
//!
//! Middleware wraps everything downstream of it on a route: later middleware,
//! body and query validation, and the handler. It is the place for
//! cross-cutting concerns such as tracing, authentication, rate limiting and
//! deadlines.
//!
//! # Onion order
//!
//! A route registered as `.middleware(a).middleware(b)` runs:
//!
//! ```text
//! a (before next) → b (before next) → validate + handler → b (after next) → a (after next)
//! ```
//!
//! A middleware that returns without calling [`Next::run`] short-circuits the
//! route: nothing downstream runs. [`Next::run`] takes `self`, so the
//! remainder of the chain can run at most once per request.
//!
//! # Writing middleware
//!
//! Closures go through [`from_fn`]; reusable middleware implements
//! [`Middleware`] directly.
//!
//! ```rust
//! use http::StatusCode;
//! use wicket::middleware::{self, Next};
//! use wicket::{route, Request, Response};
//!
//! let authed = route().middleware(middleware::from_fn(
//!     |req: Request, res: Response, next: Next| async move {
//!         if req.header("authorization").is_none() {
//!             res.set_status(StatusCode::UNAUTHORIZED).text("missing credentials");
//!             return Ok(());
//!         }
//!         next.run().await
//!     },
//! ));
//! # let _ = authed;
//! ```
//!
//! Built-in middleware:
//! - [`trace()`]: per-request span with method, path, status, latency
//! - [`timeout()`]: answers `408` when the downstream chain overruns a deadline

mod timeout;
mod trace;

pub use timeout::{timeout, Timeout};
pub use trace::{trace, Trace};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future.
///
/// `Send + 'static` lets the host runtime move in-flight requests across
/// worker threads.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A type-erased middleware shared by every route built from the same builder.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// One link in a route's chain.
///
/// Implementations are shared across concurrent requests and must not keep
/// per-request state in `self`.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, request: Request, response: Response, next: Next) -> BoxFuture<Result<(), Error>>;
}

// ── Next ─────────────────────────────────────────────────────────────────────

/// The remainder of a route's chain, from one middleware's point of view.
///
/// Each request builds its own `Next` values, each holding its position in
/// the route's immutable link list, so concurrent requests on the same route
/// share no dispatch state.
pub struct Next {
    links: Arc<[BoxedMiddleware]>,
    cursor: usize,
    request: Request,
    response: Response,
}

impl Next {
    pub(crate) fn new(links: Arc<[BoxedMiddleware]>, request: Request, response: Response) -> Self {
        Self { links, cursor: 0, request, response }
    }

    /// Runs everything downstream and resolves once it has all settled.
    /// Errors raised downstream surface here.
    ///
    /// `run` consumes the continuation, so the downstream chain cannot be
    /// entered a second time:
    ///
    /// ```rust,compile_fail
    /// use wicket::middleware::{self, Next};
    /// use wicket::{Request, Response};
    ///
    /// let twice = middleware::from_fn(|_req: Request, _res: Response, next: Next| async move {
    ///     next.run().await?;
    ///     next.run().await
    /// });
    /// # let _ = twice;
    /// ```
    pub async fn run(self) -> Result<(), Error> {
        let Self { links, cursor, request, response } = self;
        let Some(link) = links.get(cursor).cloned() else {
            return Ok(());
        };
        let next = Self {
            links,
            cursor: cursor + 1,
            request: request.clone(),
            response: response.clone(),
        };
        link.call(request, response, next).await
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("cursor", &self.cursor)
            .field("remaining", &self.links.len().saturating_sub(self.cursor))
            .finish()
    }
}

// ── from_fn ──────────────────────────────────────────────────────────────────

/// Middleware built from a closure by [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

/// Turns an async closure `(Request, Response, Next) -> Result<(), Error>`
/// into [`Middleware`].
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    FromFn { f }
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    fn call(&self, request: Request, response: Response, next: Next) -> BoxFuture<Result<(), Error>> {
        Box::pin((self.f)(request, response, next))
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> BoxedMiddleware {
        let log = Arc::clone(log);
        Arc::new(from_fn(move |_req: Request, _res: Response, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(format!("{name}:in"));
                let out = next.run().await;
                log.lock().push(format!("{name}:out"));
                out
            }
        }))
    }

    #[tokio::test]
    async fn exhausted_chain_resolves_immediately() {
        let links: Arc<[BoxedMiddleware]> = Arc::from(Vec::new());
        let next = Next::new(links, Request::builder().build(), Response::new());
        assert!(next.run().await.is_ok());
    }

    #[tokio::test]
    async fn links_unwind_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let links: Arc<[BoxedMiddleware]> =
            Arc::from(vec![recorder(&log, "a"), recorder(&log, "b"), recorder(&log, "c")]);

        Next::new(links, Request::builder().build(), Response::new())
            .run()
            .await
            .unwrap();

        assert_eq!(*log.lock(), ["a:in", "b:in", "c:in", "c:out", "b:out", "a:out"]);
    }
}
