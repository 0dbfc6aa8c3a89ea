//! Handler invocation and type erasure.
//!
//! # How typed handlers end up in an untyped chain
//!
//! A route's handler is generic over the decoded body and query types its
//! schemas produce, yet every route stores its chain as a uniform
//! `Arc<[Arc<dyn Middleware>]>`. The bridge is [`Endpoint`]: it owns the two
//! schemas and the handler, implements [`Middleware`], and is appended as the
//! implicit last link when [`RouteBuilder::build`](crate::RouteBuilder::build)
//! runs.
//!
//! ```text
//! route().body(Typed::<User>::new()).build(create_user)   ← user writes this
//!        ↓
//! Endpoint { body, query, handler }                        ← typed, generic
//!        ↓  stored as Arc<dyn Middleware>
//! link.call(req, res, next)  at request time               ← one vtable dispatch
//!        ↓
//! parse body → parse query → handler(params) → write reply
//! ```

use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::error::{Error, Target, ValidationError};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::request::Request;
use crate::response::{IntoReply, Reply, Response};
use crate::schema::{ParseResult, Schema};

/// Everything a handler receives.
///
/// `body` and `query` are the values the route's schemas decoded; the handler
/// never sees input that failed validation.
#[derive(Debug)]
pub struct Params<B, Q> {
    pub request: Request,
    pub response: Response,
    pub body: B,
    pub query: Q,
}

/// The implicit last link of every route: validation plus the handler.
pub(crate) struct Endpoint<B, Q, F> {
    body: Arc<B>,
    query: Arc<Q>,
    handler: Arc<F>,
}

impl<B, Q, F> Endpoint<B, Q, F> {
    pub(crate) fn new(body: Arc<B>, query: Arc<Q>, handler: F) -> Self {
        Self { body, query, handler: Arc::new(handler) }
    }
}

impl<B, Q, F, Fut, R> Middleware for Endpoint<B, Q, F>
where
    B: Schema,
    Q: Schema,
    F: Fn(Params<B::Output, Q::Output>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    // `next` is always exhausted here: the endpoint is the last link.
    fn call(&self, request: Request, response: Response, _next: Next) -> BoxFuture<Result<(), Error>> {
        let body_schema = Arc::clone(&self.body);
        let query_schema = Arc::clone(&self.query);
        let handler = Arc::clone(&self.handler);

        Box::pin(async move {
            let body = parse(&*body_schema, request.body().clone(), Target::Body).await?;
            let query = parse(&*query_schema, request.query().clone(), Target::Query).await?;

            let reply = handler(Params {
                request,
                response: response.clone(),
                body,
                query,
            })
            .await
            .into_reply()?;

            if let Reply::Json(value) = reply {
                let status = response.status().unwrap_or(StatusCode::OK);
                response.set_status(status);
                response.json(&value)?;
            }
            Ok(())
        })
    }
}

async fn parse<S: Schema>(
    schema: &S,
    raw: serde_json::Value,
    target: Target,
) -> Result<S::Output, ValidationError> {
    match schema.attempt_parse(raw).await {
        ParseResult::Success { data } => Ok(data),
        ParseResult::Failure { issues } => {
            debug!(%target, issues = issues.len(), "request rejected by schema");
            Err(ValidationError::new(target, issues))
        }
    }
}
