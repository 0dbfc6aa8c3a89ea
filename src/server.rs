//! Standalone hyper host with graceful shutdown.
//!
//! Most deployments embed a [`Router`] in a larger framework that already maps
//! paths to endpoints. For everything else, [`Server`] serves one router on
//! every path of a listener, turning each hyper request into a [`Request`]
//! (body decoded by content type, query percent-decoded) and each
//! [`Response`] back into a hyper response.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()`, so no new connections are made.
//! 2. Letting every in-flight connection task run to completion.
//! 3. Returning from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderMap};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching every request through
    /// `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);

        info!(addr = %self.addr, methods = ?router.methods(), "wicket listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting immediately.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(&router, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("wicket stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Converts one hyper request, runs it through the router, converts back.
///
/// Infallible: every failure becomes a response.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("failed to read request body: {e}");
            return Ok(plain(StatusCode::BAD_REQUEST, "Bad Request"));
        }
    };

    let body = match decode_body(&parts.headers, &bytes) {
        Ok(body) => body,
        Err(e) => {
            debug!("rejecting malformed JSON body: {e}");
            return Ok(plain(StatusCode::BAD_REQUEST, "Invalid JSON body"));
        }
    };

    let mut builder = Request::builder()
        .method(parts.method.as_str())
        .path(parts.uri.path())
        .headers(parts.headers)
        .body(body);
    for (key, value) in parse_pairs(parts.uri.query().unwrap_or_default()) {
        builder = builder.query(key, value);
    }

    Ok(router.respond(builder.build()).await.into_http())
}

fn plain(status: StatusCode, body: &'static str) -> http::Response<Full<Bytes>> {
    let res = Response::new();
    res.set_status(status).text(body);
    res.into_http()
}

/// Decodes a raw body according to its `content-type`.
///
/// Empty bodies are `null`; JSON is parsed; urlencoded forms become an object
/// of strings; anything else is passed on as a (lossy UTF-8) string.
fn decode_body(headers: &HeaderMap, bytes: &[u8]) -> serde_json::Result<Value> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    let content_type = headers.get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let essence = content_type.split(';').next().unwrap_or_default().trim();

    if essence == "application/json" || essence.ends_with("+json") {
        serde_json::from_slice(bytes)
    } else if essence == "application/x-www-form-urlencoded" {
        let form = String::from_utf8_lossy(bytes);
        let map = parse_pairs(&form)
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<_, _>>();
        Ok(Value::Object(map))
    } else {
        Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }
}

/// Splits `a=1&b=two+words` into decoded pairs. `+` means space.
fn parse_pairs(input: &str) -> impl Iterator<Item = (String, String)> + '_ {
    input.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
