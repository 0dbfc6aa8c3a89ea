//! Minimal wicket example: one validated JSON endpoint.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -X POST http://localhost:3000/items \
//!        -H 'content-type: application/json' \
//!        -d '{"foo":"x","bar":1}'
//!   curl -X POST http://localhost:3000/items \
//!        -H 'content-type: application/json' \
//!        -d '{"foo":4321}'                                  # 400
//!   curl 'http://localhost:3000/items?q=rust&limit=5'
//!   curl -X DELETE http://localhost:3000/items              # 405

use std::time::Duration;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use wicket::middleware::{self, Next};
use wicket::schema::{Issue, SchemaExt, Typed};
use wicket::{create_router_with, Json, Request, Response, RouterOptions, Server};

#[derive(Debug, Deserialize, Serialize)]
struct Item {
    foo: String,
    bar: f64,
}

#[derive(Debug, Deserialize, Serialize)]
struct Search {
    q: String,
    // Query values arrive as strings.
    limit: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let router = create_router_with(
        |route| {
            let base = route()
                .middleware(middleware::trace())
                .middleware(middleware::timeout(Duration::from_secs(5)));

            [
                ("GET", base.query(Typed::<Search>::new()).build(list_items)),
                (
                    "POST",
                    base.middleware(middleware::from_fn(require_json))
                        .body(Typed::<Item>::new().refine(|item| {
                            if item.foo.is_empty() {
                                Err(Issue::new("too_small", "foo must not be empty").at("foo"))
                            } else {
                                Ok(())
                            }
                        }))
                        .build(create_item),
                ),
            ]
        },
        RouterOptions::default(),
    )
    .expect("valid method map");

    Server::bind("0.0.0.0:3000")
        .serve(router)
        .await
        .expect("server error");
}

// GET /items?q=..&limit=..
async fn list_items(p: wicket::Params<serde_json::Value, Search>) -> Json<Search> {
    Json(p.query)
}

// POST /items → 201 + echo
async fn create_item(p: wicket::Params<Item, serde_json::Value>) -> Json<Item> {
    p.response.set_status(StatusCode::CREATED);
    Json(p.body)
}

async fn require_json(req: Request, res: Response, next: Next) -> Result<(), wicket::Error> {
    let is_json = req.header("content-type")
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        res.set_status(StatusCode::UNSUPPORTED_MEDIA_TYPE).text("expected application/json");
        return Ok(());
    }
    next.run().await
}
