use std::sync::Arc;

use rosterd::{App, Pipeline, Server, UserStore, api};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("ROSTERD_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    let token = std::env::var("ROSTERD_TOKEN").unwrap_or_else(|_| "mysecrettoken".to_owned());

    let store = Arc::new(UserStore::new());
    let app = App::new(api::routes(store), Pipeline::standard(token));

    Server::bind(&addr).serve(app).await.expect("server error");
}
