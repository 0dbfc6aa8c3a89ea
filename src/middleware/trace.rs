//! Per-request tracing span with latency.

use std::time::{Duration, Instant};

use http::StatusCode;
use tracing::{error, info, info_span, Instrument};

use super::{BoxFuture, Middleware, Next};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Opens a `request` span around everything downstream and logs the final
/// status and latency once the chain has settled.
///
/// Register it first so the span covers the whole route.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

pub fn trace() -> Trace {
    Trace
}

impl Middleware for Trace {
    fn call(&self, request: Request, response: Response, next: Next) -> BoxFuture<Result<(), Error>> {
        let span = info_span!("request", method = %request.method(), path = %request.path());

        Box::pin(
            async move {
                let started = Instant::now();
                let outcome = next.run().await;
                let latency_us = micros(started.elapsed());

                match &outcome {
                    Ok(()) => {
                        let status = response.status().unwrap_or(StatusCode::OK);
                        info!(status = status.as_u16(), latency_us, "request completed");
                    }
                    Err(e) => error!(error = %e, latency_us, "request failed"),
                }
                outcome
            }
            .instrument(span),
        )
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_saturates_instead_of_wrapping() {
        assert_eq!(micros(Duration::from_millis(3)), 3_000);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
