//! Bearer-token authentication stage.

use http::StatusCode;
use tracing::debug;

use crate::middleware::{BoxFuture, Next, Stage};
use crate::request::Request;
use crate::response::Response;

/// Documentation paths are exempt from authentication, matched by prefix,
/// case-insensitively.
const DOCS_PREFIX: &str = "/swagger";

/// Requires `Authorization: Bearer <token>` on every non-exempt path.
///
/// Missing header, wrong scheme, or wrong token all terminate the request
/// with 401 and body `{"error":"Unauthorized"}` — nothing downstream runs,
/// so an unauthorized request is never routed and never logged.
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    fn authorized(&self, req: &Request) -> bool {
        req.header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|t| t == self.token)
    }
}

impl Stage for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if is_exempt(req.path()) || self.authorized(&req) {
                return next.run(req).await;
            }
            debug!(path = req.path(), "rejecting unauthenticated request");
            Response::error(StatusCode::UNAUTHORIZED, "Unauthorized")
        })
    }
}

fn is_exempt(path: &str) -> bool {
    path.get(..DOCS_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(DOCS_PREFIX))
}
