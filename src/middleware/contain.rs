//! Outermost stage: turns panics into structured 500 responses.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::error;

use crate::middleware::{BoxFuture, Next, Stage};
use crate::request::Request;
use crate::response::Response;

/// Catches any panic escaping the rest of the chain — another stage, the
/// router, a handler — and answers with a generic 500. Callers never see a
/// dropped connection, only a structured response.
pub struct Containment;

impl Stage for Containment {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.path().to_owned();
            match AssertUnwindSafe(next.run(req)).catch_unwind().await {
                Ok(response) => response,
                Err(panic) => {
                    error!(%method, %path, panic = panic_message(&panic), "request panicked");
                    Response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
                }
            }
        })
    }
}

/// Best-effort extraction of a panic payload for the log line.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
