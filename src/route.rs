//! Route configuration and per-request execution.
//!
//! A [`RouteBuilder`] is an immutable value: every method returns a new
//! builder and leaves the receiver untouched, sharing the unchanged parts.
//! That makes a partly configured builder safe to reuse as a base:
//!
//! ```rust
//! use wicket::{middleware, route, Json};
//!
//! let logged = route().middleware(middleware::trace());
//!
//! let list  = logged.build(|_| async { Json(vec!["a", "b"]) });
//! let reset = logged.build(|p| async move { p.response.text("reset"); });
//! # let _ = (list, reset);
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::{Endpoint, Params};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::{IntoReply, Response};
use crate::schema::{Any, Schema};

/// Starts a route with no middleware and pass-through schemas.
pub fn route() -> RouteBuilder {
    RouteBuilder {
        body: Arc::new(Any),
        query: Arc::new(Any),
        middleware: Arc::from(Vec::new()),
    }
}

// ── RouteBuilder ─────────────────────────────────────────────────────────────

/// Chainable, immutable route configuration. Obtain via [`route()`].
///
/// `B` and `Q` are the body and query schemas; both default to [`Any`].
pub struct RouteBuilder<B = Any, Q = Any> {
    body: Arc<B>,
    query: Arc<Q>,
    middleware: Arc<[BoxedMiddleware]>,
}

impl<B, Q> Clone for RouteBuilder<B, Q> {
    fn clone(&self) -> Self {
        Self {
            body: Arc::clone(&self.body),
            query: Arc::clone(&self.query),
            middleware: Arc::clone(&self.middleware),
        }
    }
}

impl<B: Schema, Q: Schema> RouteBuilder<B, Q> {
    /// Returns a builder whose body is validated by `schema`.
    pub fn body<S: Schema>(&self, schema: S) -> RouteBuilder<S, Q> {
        RouteBuilder {
            body: Arc::new(schema),
            query: Arc::clone(&self.query),
            middleware: Arc::clone(&self.middleware),
        }
    }

    /// Returns a builder whose query is validated by `schema`.
    pub fn query<S: Schema>(&self, schema: S) -> RouteBuilder<B, S> {
        RouteBuilder {
            body: Arc::clone(&self.body),
            query: Arc::new(schema),
            middleware: Arc::clone(&self.middleware),
        }
    }

    /// Returns a builder with `middleware` appended after the existing ones.
    /// Registration order is execution order.
    pub fn middleware(&self, middleware: impl Middleware) -> Self {
        let mut links = self.middleware.to_vec();
        links.push(Arc::new(middleware));
        Self {
            body: Arc::clone(&self.body),
            query: Arc::clone(&self.query),
            middleware: Arc::from(links),
        }
    }

    /// Finalises the configuration into a [`Route`] bound to `handler`.
    ///
    /// The handler receives [`Params`] holding the decoded body and query and
    /// may return anything implementing [`IntoReply`].
    pub fn build<F, Fut, R>(&self, handler: F) -> Route
    where
        F: Fn(Params<B::Output, Q::Output>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + Send + 'static,
    {
        let endpoint: BoxedMiddleware = Arc::new(Endpoint::new(
            Arc::clone(&self.body),
            Arc::clone(&self.query),
            handler,
        ));
        let links = self.middleware.iter().cloned()
            .chain(std::iter::once(endpoint))
            .collect::<Vec<_>>();
        Route { links: Arc::from(links) }
    }
}

// ── Route ────────────────────────────────────────────────────────────────────

/// One handler with its schemas and middleware, ready to serve requests.
///
/// Immutable once built; clones share the same chain.
#[derive(Clone)]
pub struct Route {
    links: Arc<[BoxedMiddleware]>,
}

impl Route {
    /// Runs the middleware chain, then validation and the handler.
    ///
    /// Errors are returned, not handled: catching them is the router's job.
    pub async fn handle(&self, request: Request, response: Response) -> Result<(), Error> {
        Next::new(Arc::clone(&self.links), request, response).run().await
    }

    /// Number of registered middleware, not counting the endpoint.
    pub fn middleware_len(&self) -> usize {
        self.links.len() - 1
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("middleware", &self.middleware_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::middleware::from_fn;

    fn noop() -> impl Middleware {
        from_fn(|_req, _res, next: Next| next.run())
    }

    #[test]
    fn builder_methods_leave_the_receiver_untouched() {
        let base = route().middleware(noop());
        let extended = base.middleware(noop()).middleware(noop());

        let a = base.build(|_| async {});
        let b = extended.build(|_| async {});
        let c = base.build(|_| async {});

        assert_eq!(a.middleware_len(), 1);
        assert_eq!(b.middleware_len(), 3);
        assert_eq!(c.middleware_len(), 1);
    }

    #[tokio::test]
    async fn default_schemas_pass_raw_values_through() {
        let route = route().build(|p| async move {
            json!({ "body": p.body, "query": p.query })
        });
        let req = Request::builder()
            .body(json!({ "anything": [1, "two"] }))
            .query("q", "x")
            .build();
        let res = Response::new();

        route.handle(req, res.clone()).await.unwrap();

        assert_eq!(
            res.body_json(),
            Some(json!({ "body": { "anything": [1, "two"] }, "query": { "q": "x" } }))
        );
    }
}
