//! Deadline for the downstream chain.

use std::time::Duration;

use http::StatusCode;
use tracing::warn;

use super::{BoxFuture, Middleware, Next};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Races everything downstream against a deadline.
///
/// When the deadline wins, the downstream future is dropped (cancelling any
/// work it had in flight) and the response becomes `408 Request Timeout`.
/// A status or body written downstream is discarded; headers are kept.
#[derive(Clone, Copy, Debug)]
pub struct Timeout {
    limit: Duration,
}

pub fn timeout(limit: Duration) -> Timeout {
    Timeout { limit }
}

impl Middleware for Timeout {
    fn call(&self, request: Request, response: Response, next: Next) -> BoxFuture<Result<(), Error>> {
        let limit = self.limit;
        Box::pin(async move {
            match tokio::time::timeout(limit, next.run()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(method = %request.method(), path = %request.path(), ?limit, "request timed out");
                    response.reset_body();
                    response.set_status(StatusCode::REQUEST_TIMEOUT).text("Request Timeout");
                    Ok(())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::middleware::{from_fn, BoxedMiddleware};

    #[tokio::test]
    async fn overrunning_chain_is_cancelled() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let slow: BoxedMiddleware = Arc::new(from_fn(move |_req, res: Response, _next| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                res.text("too late");
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        }));
        let links: Arc<[BoxedMiddleware]> = Arc::from(vec![
            Arc::new(timeout(Duration::from_millis(50))) as BoxedMiddleware,
            slow,
        ]);

        let res = Response::new();
        Next::new(links, Request::builder().build(), res.clone()).run().await.unwrap();

        assert_eq!(res.status(), Some(StatusCode::REQUEST_TIMEOUT));
        assert_eq!(res.body_text().as_deref(), Some("Request Timeout"));
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn fast_chain_passes_through() {
        let fast: BoxedMiddleware = Arc::new(from_fn(|_req, res: Response, _next| async move {
            res.text("done");
            Ok(())
        }));
        let links: Arc<[BoxedMiddleware]> =
            Arc::from(vec![Arc::new(timeout(Duration::from_secs(1))) as BoxedMiddleware, fast]);

        let res = Response::new();
        Next::new(links, Request::builder().build(), res.clone()).run().await.unwrap();

        assert_eq!(res.status(), None);
        assert_eq!(res.body_text().as_deref(), Some("done"));
    }
}
