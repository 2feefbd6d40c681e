//! Innermost stage: one log line per routed request.

use tracing::{debug, info};

use crate::middleware::{BoxFuture, Next, Stage};
use crate::request::Request;
use crate::response::Response;

/// Logs `<METHOD> <PATH> => <STATUS>` once the downstream response returns.
///
/// Always forwards, never terminates. Sitting innermost means the status in
/// the line is the one routing produced — auth's 401 short-circuits happen
/// above this stage and are intentionally absent from the request log.
pub struct RequestLog;

impl Stage for RequestLog {
    fn name(&self) -> &'static str {
        "request-log"
    }

    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.path().to_owned();
            debug!("{method} {path}");

            let response = next.run(req).await;

            info!("{method} {path} => {status}", status = response.status_code().as_u16());
            response
        })
    }
}
