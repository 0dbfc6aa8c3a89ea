//! Method router.
//!
//! One endpoint, one [`Route`] per HTTP method. The host framework has already
//! picked the endpoint by path; this router only looks at the method. The
//! method map is validated once at construction and never changes after.
//!
//! Every failure raised below the router (validation, handler or middleware
//! errors, panics) is caught in exactly one place, [`Router::handle`], and
//! handed to the `on_error` handler.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use http::header::{self, HeaderValue};
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

use crate::error::{ConfigError, Error};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::route::{route, Route, RouteBuilder};

/// Called when no route is registered for the request's method.
pub type NotAllowedHandler = Arc<dyn Fn(&str, &Request, &Response) + Send + Sync + 'static>;

/// Called with any error that escaped a route.
pub type ErrorHandler = Arc<dyn Fn(&Error, &Request, &Response) + Send + Sync + 'static>;

// ── RouterOptions ────────────────────────────────────────────────────────────

/// Fallback behaviour for a [`Router`].
///
/// ```rust
/// use http::StatusCode;
/// use wicket::RouterOptions;
///
/// let options = RouterOptions::new()
///     .on_error(|err, _req, res| {
///         res.set_status(StatusCode::SERVICE_UNAVAILABLE).text(err.to_string());
///     });
/// # let _ = options;
/// ```
#[derive(Clone)]
pub struct RouterOptions {
    on_not_allowed: NotAllowedHandler,
    on_error: ErrorHandler,
}

impl RouterOptions {
    pub fn new() -> Self {
        Self {
            on_not_allowed: Arc::new(default_not_allowed),
            on_error: Arc::new(default_error),
        }
    }

    /// Replaces the default `405 Method Not Allowed` response.
    ///
    /// The router sets the `Allow` header before calling `f`.
    pub fn on_not_allowed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Request, &Response) + Send + Sync + 'static,
    {
        self.on_not_allowed = Arc::new(f);
        self
    }

    /// Replaces the default 400/500 error responses.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Error, &Request, &Response) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(f);
        self
    }
}

impl Default for RouterOptions {
    fn default() -> Self { Self::new() }
}

/// Default `on_not_allowed`: `405` with a plain-text body.
pub fn default_not_allowed(method: &str, _req: &Request, res: &Response) {
    debug!(%method, "method not allowed");
    res.set_status(StatusCode::METHOD_NOT_ALLOWED).text("Method Not Allowed");
}

/// Default `on_error`.
///
/// Validation failures become `400` with `{"message": .., "errors": [..]}`.
/// Anything else becomes `500` with a generic body; the error itself is
/// logged, never sent to the client. A partially written status or body is
/// replaced, but headers set upstream (CORS, request ids) are kept.
pub fn default_error(err: &Error, req: &Request, res: &Response) {
    res.reset_body();
    match err.as_validation() {
        Some(v) => {
            let body = json!({ "message": v.message(), "errors": v.issues() });
            res.set_status(StatusCode::BAD_REQUEST);
            if res.json(&body).is_err() {
                res.text(v.message());
            }
        }
        None => {
            error!(method = %req.method(), path = %req.path(), error = %err, "unhandled route error");
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR).text("Internal Server Error");
        }
    }
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Dispatches requests for one endpoint to the [`Route`] registered for
/// their method.
///
/// Built once at startup and shared (it is `Send + Sync`) by every in-flight
/// request.
#[derive(Clone)]
pub struct Router {
    routes: Arc<HashMap<Method, Route>>,
    allow: HeaderValue,
    options: RouterOptions,
}

/// Builds a router from `(method, route)` pairs.
///
/// Fails if a key is not one of `GET`, `POST`, `PUT`, `DELETE`, `PATCH`,
/// `OPTIONS`, `TRACE`, or appears twice.
///
/// An empty map is accepted. The resulting router sends every request to
/// `on_not_allowed`, with an empty `Allow` header.
///
/// ```rust
/// use wicket::{create_router, route, Json, RouterOptions};
///
/// let router = create_router(
///     [("GET", route().build(|_| async { Json("pong") }))],
///     RouterOptions::default(),
/// )
/// .unwrap();
/// # let _ = router;
///
/// assert!(create_router([("FOO", route().build(|_| async {}))], RouterOptions::default()).is_err());
/// ```
pub fn create_router<I, K>(routes: I, options: RouterOptions) -> Result<Router, ConfigError>
where
    I: IntoIterator<Item = (K, Route)>,
    K: AsRef<str>,
{
    let mut map = HashMap::new();
    for (key, route) in routes {
        let method: Method = key.as_ref().parse()?;
        if map.insert(method, route).is_some() {
            return Err(ConfigError::DuplicateMethod(method));
        }
    }
    Ok(Router::from_map(map, options))
}

/// Builds a router from a factory that is handed the [`route`] constructor,
/// so shared builder state can be closed over in one place.
///
/// ```rust
/// use wicket::{create_router_with, middleware, Json, RouterOptions};
///
/// let router = create_router_with(
///     |route| {
///         let logged = route().middleware(middleware::trace());
///         [
///             ("GET", logged.build(|_| async { Json("list") })),
///             ("DELETE", logged.build(|_| async {})),
///         ]
///     },
///     RouterOptions::default(),
/// )
/// .unwrap();
/// # let _ = router;
/// ```
pub fn create_router_with<F, I, K>(factory: F, options: RouterOptions) -> Result<Router, ConfigError>
where
    F: FnOnce(fn() -> RouteBuilder) -> I,
    I: IntoIterator<Item = (K, Route)>,
    K: AsRef<str>,
{
    create_router(factory(route), options)
}

impl Router {
    /// Shorthand for [`create_router`] with default options.
    pub fn new<I, K>(routes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, Route)>,
        K: AsRef<str>,
    {
        create_router(routes, RouterOptions::default())
    }

    fn from_map(routes: HashMap<Method, Route>, options: RouterOptions) -> Self {
        let allow = Method::ALL.iter()
            .filter(|m| routes.contains_key(*m))
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            routes: Arc::new(routes),
            // Only ASCII method names go in, so this cannot fail. Empty when
            // no route is registered.
            allow: HeaderValue::from_str(&allow).unwrap_or(HeaderValue::from_static("")),
            options,
        }
    }

    /// Methods with a registered route, in canonical order.
    pub fn methods(&self) -> Vec<Method> {
        Method::ALL.into_iter().filter(|m| self.routes.contains_key(m)).collect()
    }

    /// Dispatches one request, writing the outcome to `response`.
    ///
    /// Never fails: unmatched methods go to `on_not_allowed`, and every error
    /// or panic raised by the route goes to `on_error`, exactly once.
    pub async fn handle(&self, request: Request, response: Response) {
        let route = request.method().parse::<Method>().ok()
            .and_then(|m| self.routes.get(&m));

        let Some(route) = route else {
            response.set_header(header::ALLOW, self.allow.clone());
            (self.options.on_not_allowed)(request.method(), &request, &response);
            return;
        };

        debug!(method = %request.method(), path = %request.path(), "dispatching");

        let outcome = AssertUnwindSafe(route.handle(request.clone(), response.clone()))
            .catch_unwind()
            .await;

        let err = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(panic) => Error::Panic(panic_message(panic.as_ref())),
        };
        (self.options.on_error)(&err, &request, &response);
    }

    /// Dispatches one request into a fresh [`Response`] and returns it.
    pub async fn respond(&self, request: Request) -> Response {
        let response = Response::new();
        self.handle(request, response.clone()).await;
        response
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.methods())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
