//! # wicket
//!
//! Method dispatch, onion middleware and request validation for one HTTP
//! endpoint. Nothing more.
//!
//! ## The contract
//!
//! The host framework maps paths to endpoints, owns the sockets and reads the
//! bytes. wicket takes over once a request has reached an endpoint:
//!
//! - **Method dispatch**: one [`Route`] per method, checked at startup
//! - **Middleware**: onion-ordered, able to wrap or short-circuit everything
//!   downstream
//! - **Validation**: body and query go through a [`Schema`] before the
//!   handler runs; the handler only ever sees decoded data
//! - **Normalisation**: whatever the handler returns becomes a JSON response
//! - **One error funnel**: everything that goes wrong ends up in the router's
//!   `on_error` handler, once
//!
//! What wicket intentionally leaves to middleware you write: authentication,
//! rate limiting, anything path-based.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use wicket::schema::Typed;
//! use wicket::{create_router_with, middleware, Json, RouterOptions, Server};
//!
//! #[derive(Deserialize, Serialize)]
//! struct Item {
//!     foo: String,
//!     bar: f64,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = create_router_with(
//!         |route| {
//!             let logged = route().middleware(middleware::trace());
//!             [
//!                 ("GET", logged.build(|p| async move { Json(p.query) })),
//!                 ("POST", logged.body(Typed::<Item>::new()).build(|p| async move { Json(p.body) })),
//!             ]
//!         },
//!         RouterOptions::default(),
//!     )
//!     .expect("valid method map");
//!
//!     Server::bind("0.0.0.0:3000").serve(router).await.unwrap();
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod route;
mod router;
mod server;

pub mod middleware;
pub mod schema;

pub use error::{BoxError, ConfigError, Error, Target, ValidationError};
pub use handler::Params;
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{IntoReply, Json, Reply, Response};
pub use route::{route, Route, RouteBuilder};
pub use router::{
    create_router, create_router_with, default_error, default_not_allowed, ErrorHandler,
    NotAllowedHandler, Router, RouterOptions,
};
pub use schema::{Issue, ParseResult, Schema};
pub use server::Server;
