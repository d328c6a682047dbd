//! Common test utilities
//!
//! Every integration test runs the full router over the in-memory store,
//! with a cheap bcrypt cost and a temporary media directory. HTTP goes
//! through the axum-test mock transport; WebSocket tests additionally serve
//! the same router on a local port.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

use chatline::backend::server::{build_app, AppState, Stores};
use chatline::shared::AppConfig;

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    router: Router,
    _media_dir: TempDir,
}

/// A registered and logged-in user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

pub fn test_config(media_dir: &TempDir) -> AppConfig {
    AppConfig::builder()
        .jwt_secret("integration-test-secret")
        .bcrypt_cost(4)
        .page_size(3)
        .ping_interval_secs(1)
        .media_dir(media_dir.path())
        .build()
        .expect("test config is valid")
}

pub fn spawn_app() -> TestApp {
    let media_dir = tempfile::tempdir().expect("create media dir");
    let app = build_app(test_config(&media_dir), Stores::memory());
    let server = TestServer::new(app.router.clone()).expect("start test server");
    TestApp {
        server,
        state: app.state,
        router: app.router,
        _media_dir: media_dir,
    }
}

impl TestApp {
    /// Serve the router on a free local port and return its address
    ///
    /// Shares state with `server`, so users registered over HTTP can open
    /// sockets here.
    pub async fn listen(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve test app");
        });
        addr
    }

    pub async fn register(&self, full_name: &str, email: &str, password: &str) -> axum_test::TestResponse {
        self.server
            .post("/api/v1/users/register")
            .json(&json!({ "fullName": full_name, "email": email, "password": password }))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> axum_test::TestResponse {
        self.server
            .post("/api/v1/users/login")
            .json(&json!({ "email": email, "password": password }))
            .await
    }

    /// Register and log in, returning the id and access token
    pub async fn user(&self, full_name: &str, email: &str) -> TestUser {
        let password = "password123";
        self.register(full_name, email, password).await.assert_status_success();
        let body: Value = self.login(email, password).await.json();
        TestUser {
            id: body["data"]["user"]["id"].as_str().and_then(|s| s.parse().ok()).expect("user id"),
            email: email.to_string(),
            token: body["data"]["accessToken"].as_str().expect("access token").to_string(),
        }
    }

    /// Log an existing user in again, returning a new access token
    pub async fn user_session(&self, email: &str) -> String {
        let body: Value = self.login(email, "password123").await.json();
        body["data"]["accessToken"].as_str().expect("access token").to_string()
    }

    /// Create (or fetch) the chat between two users, returning its id
    pub async fn chat(&self, caller: &TestUser, receiver: &TestUser) -> Uuid {
        let body: Value = self
            .server
            .post("/api/v1/chat/individual/create-chat")
            .authorization_bearer(&caller.token)
            .json(&json!({ "receiverId": receiver.id }))
            .await
            .json();
        body["data"]["id"].as_str().and_then(|s| s.parse().ok()).expect("chat id")
    }

    pub async fn send(&self, sender: &TestUser, chat_id: Uuid, text: &str) -> axum_test::TestResponse {
        self.server
            .post(&format!("/api/v1/chat/individual/send-message/{}", chat_id))
            .authorization_bearer(&sender.token)
            .json(&json!({ "message": text }))
            .await
    }
}
