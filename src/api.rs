//! The CRUD handlers over the user collection.
//!
//! Validation failures and missing ids are ordinary return values here —
//! 400 and 404 responses, never panics. Each handler body additionally runs
//! under [`contained`], a local panic net that answers 500 with a
//! contextual message; the pipeline's containment stage remains the
//! backstop for faults outside handler bodies.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use http::{Method, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::handler::Handler;
use crate::middleware::panic_message;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::store::UserStore;
use crate::user::{User, validate};

/// Registers every route of the service against the given store.
pub fn routes(store: Arc<UserStore>) -> Router {
    Router::new()
        .on(Method::GET, "/users", bind(Arc::clone(&store), list_users))
        .on(Method::GET, "/users/{id}", bind(Arc::clone(&store), get_user))
        .on(Method::POST, "/users", bind(Arc::clone(&store), create_user))
        .on(Method::PUT, "/users/{id}", bind(Arc::clone(&store), update_user))
        .on(Method::DELETE, "/users/{id}", bind(store, delete_user))
        .on(Method::GET, "/swagger", docs_index)
}

/// Adapts a `(store, request)` handler into the router's `(request)` shape.
fn bind<F, Fut>(store: Arc<UserStore>, f: F) -> impl Handler
where
    F: Fn(Arc<UserStore>, Request) -> Fut + Copy + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    move |req| f(Arc::clone(&store), req)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn list_users(store: Arc<UserStore>, _req: Request) -> Response {
    contained("list users", async move { Response::json(to_json(&store.list())) }).await
}

async fn get_user(store: Arc<UserStore>, req: Request) -> Response {
    contained("get user", async move {
        let Some(id) = path_id(&req) else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        match store.get(id) {
            Some(user) => Response::json(to_json(&user)),
            None => Response::status(StatusCode::NOT_FOUND),
        }
    })
    .await
}

async fn create_user(store: Arc<UserStore>, req: Request) -> Response {
    contained("create user", async move {
        let user = match parse_payload(req.body()) {
            Ok(user) => user,
            Err(rejection) => return rejection,
        };
        if let Err(e) = validate(&user) {
            return Response::error(StatusCode::BAD_REQUEST, e.message);
        }
        let user = store.insert(user);
        Response::builder()
            .status(StatusCode::CREATED)
            .header("location", &format!("/users/{}", user.id))
            .json(to_json(&user))
    })
    .await
}

async fn update_user(store: Arc<UserStore>, req: Request) -> Response {
    contained("update user", async move {
        let Some(id) = path_id(&req) else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        // Existence is checked before the payload: an update of a missing
        // record is 404 even when the payload would also fail validation.
        if !store.contains(id) {
            return Response::status(StatusCode::NOT_FOUND);
        }
        let user = match parse_payload(req.body()) {
            Ok(user) => user,
            Err(rejection) => return rejection,
        };
        if let Err(e) = validate(&user) {
            return Response::error(StatusCode::BAD_REQUEST, e.message);
        }
        match store.replace(id, user) {
            Some(user) => Response::json(to_json(&user)),
            // Deleted between the existence probe and the replace.
            None => Response::status(StatusCode::NOT_FOUND),
        }
    })
    .await
}

async fn delete_user(store: Arc<UserStore>, req: Request) -> Response {
    contained("delete user", async move {
        let Some(id) = path_id(&req) else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        if store.remove(id) {
            Response::status(StatusCode::NO_CONTENT)
        } else {
            Response::status(StatusCode::NOT_FOUND)
        }
    })
    .await
}

/// Minimal routable target under the documentation prefix, so the auth
/// exemption points at something. The interactive UI itself is out of scope.
async fn docs_index(_req: Request) -> Response {
    Response::json(br#"{"service":"rosterd","resources":["/users"]}"#.to_vec())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Local safety net: a panic inside a handler body becomes a 500 with a
/// message naming the operation, independent of the pipeline's containment.
async fn contained(op: &'static str, work: impl Future<Output = Response>) -> Response {
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            error!(op, panic = panic_message(&panic), "handler panicked");
            Response::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("{op} failed unexpectedly."),
            )
        }
    }
}

/// A non-integer id can never name a live record, so it reads as 404.
fn path_id(req: &Request) -> Option<u64> {
    req.param("id")?.parse().ok()
}

fn parse_payload(body: &[u8]) -> Result<User, Response> {
    serde_json::from_slice(body).map_err(|e| {
        Response::error(StatusCode::BAD_REQUEST, &format!("invalid user payload: {e}"))
    })
}

// Serializing records made of strings and integers cannot fail.
fn to_json<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}
