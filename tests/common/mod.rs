//! Mock vault for gateway tests
//!
//! Serves the logon, logoff and resource endpoints under the API root with
//! wiremock so every downstream call can be inspected.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use pvwa_rs::vault::create_http_client;
use pvwa_rs::{Gateway, LoginRequest, Session};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "Zm9vYmFyLXRva2VuLTEyMw==";

pub struct MockVault {
    pub server: MockServer,
}

impl MockVault {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Vault-native logon answering with `body` (the raw token text)
    pub async fn mount_logon(&self, logon: &str, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/PasswordVault/API/auth/{logon}/Logon")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Echo `{"ok":true}` for any GET carrying the expected token
    pub async fn mount_authorized_echo(&self) {
        Mock::given(method("GET"))
            .and(path_regex(r"^/PasswordVault/API/.+"))
            .and(header("Authorization", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&self.server)
            .await;
    }

    /// Fail the test if any request reaches the vault
    pub async fn expect_no_calls(&self) {
        Mock::given(path_regex(".*"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    pub fn login_request(&self) -> LoginRequest {
        LoginRequest {
            base_url: self.base_url(),
            username: "operator".to_string(),
            password: "Passw0rd!".to_string(),
            ..Default::default()
        }
    }

    /// A session for this vault, as a fresh login would produce
    pub fn session(&self, token: &str) -> Session {
        Session::new(
            token.to_string(),
            format!("{}/", self.base_url()),
            "operator".to_string(),
            Utc::now(),
        )
    }

    pub fn expired_session(&self) -> Session {
        Session::new(
            TOKEN.to_string(),
            format!("{}/", self.base_url()),
            "operator".to_string(),
            Utc::now() - Duration::minutes(30),
        )
    }
}

pub fn gateway() -> Gateway {
    Gateway::new(http_client())
}

pub fn http_client() -> reqwest::Client {
    create_http_client(std::time::Duration::from_secs(5)).expect("http client")
}

pub fn segments(path: &str) -> Vec<String> {
    path.split('/').map(str::to_string).collect()
}
