//! Onion ordering, short-circuiting and builder reuse.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use parking_lot::Mutex;
use serde_json::{json, Value};
use wicket::middleware::{self, Middleware, Next};
use wicket::schema::{self, ParseResult};
use wicket::{route, Json, Request, Response, Router};

type Log = Arc<Mutex<Vec<String>>>;

fn logging(log: &Log, name: &'static str) -> impl Middleware {
    let log = Arc::clone(log);
    middleware::from_fn(move |_req, _res, next: Next| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push(format!("{name}:before"));
            let out = next.run().await;
            log.lock().push(format!("{name}:after"));
            out
        }
    })
}

/// A body schema that records when validation happens.
fn logged_body(log: &Log) -> impl wicket::Schema<Output = Value> {
    let log = Arc::clone(log);
    schema::from_fn(move |value: Value| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push("validate".to_owned());
            ParseResult::success(value)
        }
    })
}

#[tokio::test]
async fn middleware_wraps_validation_and_handler_in_onion_order() {
    let log: Log = Arc::default();
    let handler_log = Arc::clone(&log);

    let get = route()
        .middleware(logging(&log, "m1"))
        .middleware(logging(&log, "m2"))
        .body(logged_body(&log))
        .build(move |_| {
            let log = Arc::clone(&handler_log);
            async move { log.lock().push("handler".to_owned()) }
        });
    let router = Router::new([("GET", get)]).unwrap();

    router.respond(Request::builder().build()).await;

    assert_eq!(
        *log.lock(),
        ["m1:before", "m2:before", "validate", "handler", "m2:after", "m1:after"]
    );
}

#[tokio::test]
async fn middleware_that_skips_next_short_circuits_the_route() {
    let log: Log = Arc::default();
    let handler_log = Arc::clone(&log);

    let gate = middleware::from_fn(|req: Request, res: Response, next: Next| async move {
        if req.header("authorization").is_none() {
            res.set_status(StatusCode::UNAUTHORIZED).text("missing credentials");
            return Ok(());
        }
        next.run().await
    });
    let get = route()
        .middleware(logging(&log, "outer"))
        .middleware(gate)
        .middleware(logging(&log, "inner"))
        .build(move |_| {
            let log = Arc::clone(&handler_log);
            async move { log.lock().push("handler".to_owned()) }
        });
    let router = Router::new([("GET", get)]).unwrap();

    let res = router.respond(Request::builder().build()).await;

    assert_eq!(res.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(*log.lock(), ["outer:before", "outer:after"]);
}

#[tokio::test]
async fn middleware_can_hand_data_to_the_handler() {
    #[derive(Clone)]
    struct User(&'static str);

    let authenticate = middleware::from_fn(|req: Request, _res, next: Next| async move {
        req.insert_extension(User("ada"));
        next.run().await
    });
    let get = route()
        .middleware(authenticate)
        .build(|p| async move {
            let user = p.request.extension::<User>().map(|u| u.0);
            Json(json!({ "user": user }))
        });
    let router = Router::new([("GET", get)]).unwrap();

    let res = router.respond(Request::builder().build()).await;

    assert_eq!(res.body_json(), Some(json!({ "user": "ada" })));
}

#[tokio::test]
async fn middleware_sees_the_handler_outcome_after_next() {
    let stamp = middleware::from_fn(|_req, res: Response, next: Next| async move {
        let out = next.run().await;
        let status = res.status().unwrap_or(StatusCode::OK);
        res.set_header(
            http::header::HeaderName::from_static("x-seen-status"),
            http::HeaderValue::from(status.as_u16()),
        );
        out
    });
    let router = Router::new([("GET", route().middleware(stamp).build(|_| async { Json(1) }))]).unwrap();

    let res = router.respond(Request::builder().build()).await;

    assert_eq!(res.header("x-seen-status").unwrap(), "200");
    assert_eq!(res.body_json(), Some(json!(1)));
}

#[tokio::test]
async fn shared_base_builder_is_not_affected_by_derived_routes() {
    let log: Log = Arc::default();
    let base = route().middleware(logging(&log, "base"));
    let audited = base.middleware(logging(&log, "audit"));

    let router = Router::new([
        ("GET", base.build(|_| async { Json("plain") })),
        ("DELETE", audited.build(|_| async { Json("audited") })),
    ])
    .unwrap();

    router.respond(Request::builder().method("GET").build()).await;
    assert_eq!(*log.lock(), ["base:before", "base:after"]);

    log.lock().clear();
    router.respond(Request::builder().method("DELETE").build()).await;
    assert_eq!(
        *log.lock(),
        ["base:before", "audit:before", "audit:after", "base:after"]
    );
}

#[tokio::test]
async fn built_in_trace_and_timeout_compose() {
    let slow = route()
        .middleware(middleware::trace())
        .middleware(middleware::timeout(Duration::from_millis(20)))
        .build(|_| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json("never")
        });
    let fast = route()
        .middleware(middleware::trace())
        .middleware(middleware::timeout(Duration::from_secs(2)))
        .build(|_| async { Json("ok") });
    let router = Router::new([("GET", fast), ("POST", slow)]).unwrap();

    let res = router.respond(Request::builder().method("POST").build()).await;
    assert_eq!(res.status(), Some(StatusCode::REQUEST_TIMEOUT));

    let res = router.respond(Request::builder().method("GET").build()).await;
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body_json(), Some(json!("ok")));
}
