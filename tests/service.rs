//! End-to-end tests driving the full chain — containment, bearer auth,
//! request logging, routing, handlers, store — through [`App::handle`],
//! no socket involved.

use std::sync::Arc;

use http::{Method, StatusCode};
use serde_json::{Value, json};

use rosterd::{App, Pipeline, Request, UserStore, api};

const TOKEN: &str = "mysecrettoken";

fn app() -> App {
    let store = Arc::new(UserStore::new());
    App::new(api::routes(store), Pipeline::standard(TOKEN))
}

fn authed(method: Method, path: &str) -> Request {
    Request::new(method, path).with_header("authorization", &format!("Bearer {TOKEN}"))
}

fn ada() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@x.com",
        "department": "Eng"
    })
}

fn body_json(response: &rosterd::Response) -> Value {
    serde_json::from_slice(response.body()).expect("response body is JSON")
}

#[tokio::test]
async fn full_crud_scenario() {
    let app = app();

    // First create gets id 1 and a location header.
    let response = app
        .handle(authed(Method::POST, "/users").with_body(ada().to_string().into_bytes()))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.header("location"), Some("/users/1"));
    assert_eq!(body_json(&response)["id"], 1);

    // Second create gets id 2.
    let response = app
        .handle(authed(Method::POST, "/users").with_body(ada().to_string().into_bytes()))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(body_json(&response)["id"], 2);

    // Both are listed.
    let response = app.handle(authed(Method::GET, "/users")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(body_json(&response).as_array().unwrap().len(), 2);

    // Delete 1, then it is gone.
    let response = app.handle(authed(Method::DELETE, "/users/1")).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert!(response.body().is_empty());

    let response = app.handle(authed(Method::GET, "/users/1")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.body().is_empty());

    // Update 2 with a payload claiming id 999: the path id wins.
    let mut payload = ada();
    payload["id"] = json!(999);
    payload["department"] = json!("Research");
    let response = app
        .handle(authed(Method::PUT, "/users/2").with_body(payload.to_string().into_bytes()))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = body_json(&response);
    assert_eq!(updated["id"], 2);
    assert_eq!(updated["department"], "Research");

    let response = app.handle(authed(Method::GET, "/users/2")).await;
    assert_eq!(body_json(&response)["department"], "Research");
}

#[tokio::test]
async fn create_reports_first_failing_field() {
    let app = app();
    // Missing firstName and email: firstName must win.
    let payload = json!({ "lastName": "Lovelace", "department": "Eng" });
    let response = app
        .handle(authed(Method::POST, "/users").with_body(payload.to_string().into_bytes()))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&response)["error"], "firstName must not be empty.");
}

#[tokio::test]
async fn create_rejects_malformed_json() {
    let app = app();
    let response = app
        .handle(authed(Method::POST, "/users").with_body(b"not json".to_vec()))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let error = body_json(&response)["error"].as_str().unwrap().to_owned();
    assert!(error.starts_with("invalid user payload"), "got: {error}");
}

#[tokio::test]
async fn update_checks_existence_before_validation() {
    let app = app();
    // Missing record AND invalid payload: 404 wins.
    let response = app
        .handle(authed(Method::PUT, "/users/77").with_body(b"not json".to_vec()))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_of_existing_record_still_validates() {
    let app = app();
    app.handle(authed(Method::POST, "/users").with_body(ada().to_string().into_bytes()))
        .await;

    let mut payload = ada();
    payload["email"] = json!("no-at-sign");
    let response = app
        .handle(authed(Method::PUT, "/users/1").with_body(payload.to_string().into_bytes()))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&response)["error"], "email must contain an '@' character.");
}

#[tokio::test]
async fn non_integer_id_is_not_found() {
    let app = app();
    for (method, path) in [
        (Method::GET, "/users/abc"),
        (Method::PUT, "/users/abc"),
        (Method::DELETE, "/users/abc"),
    ] {
        let response = app
            .handle(authed(method.clone(), path).with_body(ada().to_string().into_bytes()))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{method} {path}");
    }
}

#[tokio::test]
async fn delete_missing_record_is_not_found() {
    let app = app();
    let response = app.handle(authed(Method::DELETE, "/users/5")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_routes_require_the_bearer_token() {
    let app = app();

    let response = app.handle(Request::new(Method::GET, "/users")).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.body(), br#"{"error":"Unauthorized"}"#);

    let wrong = Request::new(Method::GET, "/users").with_header("authorization", "Bearer nope");
    let response = app.handle(wrong).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app.handle(authed(Method::GET, "/users")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn documentation_path_needs_no_credentials() {
    let app = app();
    let response = app.handle(Request::new(Method::GET, "/swagger")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_routes_sit_behind_auth() {
    let app = app();

    // Auth fires before routing: no token means 401 even for paths that
    // match nothing.
    let response = app.handle(Request::new(Method::GET, "/nope")).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app.handle(authed(Method::GET, "/nope")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_creates_assign_distinct_ids() {
    let app = Arc::new(app());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..10 {
                    let response = app
                        .handle(
                            authed(Method::POST, "/users")
                                .with_body(ada().to_string().into_bytes()),
                        )
                        .await;
                    assert_eq!(response.status_code(), StatusCode::CREATED);
                    ids.push(body_json(&response)["id"].as_u64().unwrap());
                }
                ids
            })
        })
        .collect();

    let mut seen = std::collections::HashSet::new();
    for task in tasks {
        for id in task.await.unwrap() {
            assert!(seen.insert(id), "id {id} assigned twice");
        }
    }
    assert_eq!(seen.len(), 80);
}
