//! Shared setup for the API integration tests.
#![allow(dead_code)]

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use httpmock::MockServer;
use pokedex_api::api::server::PokedexServer;
use pokedex_api::config::{AppConfig, PasswordHashConfig};
use serde_json::{json, Value};

pub const ADMIN_LOGIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-test-pass";

pub fn test_config(catalog_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.auth.password = PasswordHashConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    config.catalog.base_url = catalog_url.to_string();
    config.catalog.timeout_secs = Some(5);
    config.bootstrap.admin_password = ADMIN_PASSWORD.to_string();
    config
}

/// Full router over an in-memory store, with the catalog pointed at `catalog`.
pub async fn test_server(catalog: &MockServer) -> TestServer {
    let config = test_config(&catalog.url("/api/v2"));
    let server = PokedexServer::new(config).await.unwrap();
    TestServer::new(server.create_router()).unwrap()
}

pub fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

pub async fn register(server: &TestServer, login: &str) -> i64 {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "nome": login.to_uppercase(),
            "login": login,
            "email": format!("{}@poke.dex", login),
            "senha": "secret1"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["usuario"]["id"].as_i64().unwrap()
}

pub async fn login(server: &TestServer, login: &str, senha: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({ "login": login, "senha": senha }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Registers `login` with password `secret1` and returns (id, token).
pub async fn user_session(server: &TestServer, login_name: &str) -> (i64, String) {
    let id = register(server, login_name).await;
    let token = login(server, login_name, "secret1").await;
    (id, token)
}

pub async fn admin_session(server: &TestServer) -> (i64, String) {
    let response = server
        .post("/auth/login")
        .json(&json!({ "login": ADMIN_LOGIN, "senha": ADMIN_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    let id = body["usuario"]["id"].as_i64().unwrap();
    let token = body["access_token"].as_str().unwrap().to_string();
    (id, token)
}
