//! Test helpers for Web API integration tests.

#![allow(dead_code)]

use axum_test::TestServer;
use serde_json::{json, Value};

use nimbus::web::WebServer;
use nimbus::{Config, Database};

/// Create a test configuration.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config.locale.languages = vec!["en".to_string(), "ja".to_string()];
    config
}

/// Create a test server with an in-memory database.
pub async fn create_test_server() -> (TestServer, Database) {
    create_test_server_with(create_test_config()).await
}

/// Create a test server with the given configuration.
pub async fn create_test_server_with(config: Config) -> (TestServer, Database) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let web = WebServer::new(&config, db.clone()).expect("Failed to create web server");
    let server = TestServer::new(web.router()).expect("Failed to create test server");

    (server, db)
}

/// Register a user through the API and return the response body.
pub async fn register_user(server: &TestServer, username: &str) -> Value {
    let response = server
        .post("/api/users")
        .json(&json!({ "username": username }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// Find a storage ID by type ("main", "trash" or "thumb") in a registration.
pub fn storage_id(registration: &Value, storage_type: &str) -> i64 {
    registration["data"]["storages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["storage_type"] == storage_type)
        .and_then(|s| s["id"].as_i64())
        .unwrap()
}

/// Create a file through the API and return the response body.
pub async fn create_file(server: &TestServer, storage: i64, name: &str, size: i64) -> Value {
    let response = server
        .post("/api/files")
        .json(&json!({ "storage": storage, "name": name, "size": size }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// Create a directory through the API and return its ID.
pub async fn create_directory(
    server: &TestServer,
    storage: i64,
    name: &str,
    parent: Option<&str>,
) -> String {
    let response = server
        .post(&format!("/api/storages/{storage}/directories"))
        .json(&json!({ "name": name, "parent": parent }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}
