//! # rosterd
//!
//! A minimal user-records CRUD service behind a fixed middleware chain.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! Every request passes through the same three stages, in the same order,
//! before it is routed:
//!
//! 1. **Containment** — a panic anywhere below becomes a structured 500.
//! 2. **Bearer auth** — non-documentation paths require
//!    `Authorization: Bearer <token>`; failures stop here with 401.
//! 3. **Request log** — one `<METHOD> <PATH> => <STATUS>` line per routed
//!    request.
//!
//! Behind the chain sit five handlers over `/users`, a pure field
//! validator, and a mutex-guarded in-memory store that owns the record map
//! and the id counter. Ids are unique, strictly increasing, and never
//! reused.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rosterd::{App, Pipeline, Server, UserStore, api};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(UserStore::new());
//!     let app = App::new(api::routes(store), Pipeline::standard("mysecrettoken"));
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod store;
mod user;

pub mod api;
pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use middleware::{BearerAuth, Containment, Next, Pipeline, RequestLog, Stage};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{App, Server};
pub use store::UserStore;
pub use user::{FieldError, User, validate};
