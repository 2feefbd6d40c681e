//! HTTP server, request dispatch, and graceful shutdown.
//!
//! The server owns only transport concerns: accepting connections, reading
//! bodies, and writing responses. Everything with behavior — the middleware
//! chain and routing — lives in [`App`], which tests drive in-process
//! without a socket.
//!
//! On SIGTERM or Ctrl-C the accept loop stops immediately and every
//! in-flight connection task runs to completion before
//! [`Server::serve`] returns.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::middleware::{BoxFuture, Pipeline};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The assembled service: router behind the fixed middleware chain.
pub struct App {
    router: Arc<Router>,
    pipeline: Pipeline,
}

impl App {
    pub fn new(router: Router, pipeline: Pipeline) -> Self {
        Self { router: Arc::new(router), pipeline }
    }

    /// Runs one request through the full chain: containment, auth, logging,
    /// then routing. Unmatched paths answer 404 from the routing step, so
    /// they are still subject to authentication.
    pub async fn handle(&self, req: Request) -> Response {
        let router = Arc::clone(&self.router);
        let endpoint = move |req: Request| -> BoxFuture<'static, Response> {
            let router = Arc::clone(&router);
            Box::pin(async move { route(router, req).await })
        };
        self.pipeline.run(req, &endpoint).await
    }
}

async fn route(router: Arc<Router>, mut req: Request) -> Response {
    let matched = router.lookup(req.method(), req.path());
    match matched {
        Some((handler, params)) => {
            req.set_params(params);
            handler.call(req).await
        }
        None => Response::status(http::StatusCode::NOT_FOUND),
    }
}

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

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, app: App) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let app = Arc::new(app);

        info!(addr = %self.addr, "rosterd listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a shutdown signal stops
                // accepting immediately, even with connections queued.
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

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, not once
                        // per connection.
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req).await }
                        });

                        // `auto::Builder` serves HTTP/1.1 or HTTP/2, whatever
                        // the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("rosterd stopped");
        Ok(())
    }
}

/// Bridges hyper's request type to [`App::handle`].
///
/// The error type is [`Infallible`](std::convert::Infallible) — every
/// failure is expressed as an HTTP response, so hyper never sees an error.
async fn dispatch(
    app: Arc<App>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            error!("failed to read request body: {e}");
            let rejection =
                Response::error(http::StatusCode::BAD_REQUEST, "failed to read request body");
            return Ok(rejection.into_hyper());
        }
    };

    let mut request = Request::new(parts.method, parts.uri.path());
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    let request = request.with_body(body);

    Ok(app.handle(request).await.into_hyper())
}

/// Resolves on the first shutdown signal: SIGTERM or SIGINT on Unix,
/// Ctrl-C elsewhere.
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

    // `pending()` never resolves — the SIGTERM arm is disabled off Unix.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
