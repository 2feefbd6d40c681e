//! The fixed-order middleware chain.
//!
//! Every request flows through the same three stages before routing:
//!
//! ```text
//! request → containment → bearer auth → request log → router → handler
//!                                                                 ↓
//! response ← containment ← bearer auth ← request log ←────────────┘
//! ```
//!
//! The order is a contract, not a code-layout accident, and it is not
//! reconfigurable: [`Pipeline::standard`] is the only public constructor.
//!
//! - **Containment** sits outermost so a panic anywhere below it — another
//!   stage, the router, a handler — still becomes a structured 500.
//! - **Bearer auth** short-circuits with 401 before anything downstream
//!   runs.
//! - **Request log** is innermost, so it sees the status the routing layer
//!   actually produced. A 401 from the auth stage is deliberately never
//!   logged: only requests that reach routing produce a log line.
//!
//! A stage receives the request and a [`Next`] handle; it either forwards
//! (`next.run(req).await`) or produces a terminal response itself.

use std::future::Future;
use std::pin::Pin;

use crate::request::Request;
use crate::response::Response;

mod auth;
mod contain;
mod log;

pub use auth::BearerAuth;
pub use contain::Containment;
pub(crate) use contain::panic_message;
pub use log::RequestLog;

/// A heap-allocated, type-erased future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal of the chain: whatever routes and runs the handler.
pub(crate) type Endpoint = dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync;

/// One link in the middleware chain.
pub trait Stage: Send + Sync + 'static {
    /// Stage name, for logs.
    fn name(&self) -> &'static str;

    /// Process the request: forward via `next` or short-circuit a response.
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// Handle to the rest of the chain. Consumed by [`Next::run`], so a stage
/// can forward at most once.
pub struct Next<'a> {
    stages: &'a [Box<dyn Stage>],
    endpoint: &'a Endpoint,
}

impl Next<'_> {
    /// Invokes the next stage, or the endpoint once the chain is exhausted.
    pub async fn run(self, req: Request) -> Response {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                stage.handle(req, Next { stages: rest, endpoint: self.endpoint }).await
            }
            None => (self.endpoint)(req).await,
        }
    }
}

/// The assembled chain.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// The service pipeline: containment, then bearer auth with the given
    /// shared-secret token, then request logging.
    pub fn standard(token: impl Into<String>) -> Self {
        Self {
            stages: vec![
                Box::new(Containment),
                Box::new(BearerAuth::new(token)),
                Box::new(RequestLog),
            ],
        }
    }

    pub(crate) async fn run(&self, req: Request, endpoint: &Endpoint) -> Response {
        Next { stages: &self.stages, endpoint }.run(req).await
    }
}
