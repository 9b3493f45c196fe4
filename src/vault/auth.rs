use chrono::Utc;
use reqwest::Client;
use serde_json::json;

use super::credentials::Credentials;
use super::session::SessionSeed;
use super::response::classify;
use super::token::{is_html_body, preview, preview_with_limit, sanitize_token, token_fingerprint};
use super::{ensure_trailing_slash, logon_path, API_ROOT, LOGOFF_PATH};
use crate::utils::errors::GatewayFailure;

pub struct VaultAuth {
    client: Client,
}

impl VaultAuth {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Log on to the vault and turn the returned token into a session seed.
    ///
    /// One attempt only; failures come back classified.
    pub async fn acquire(&self, credentials: &Credentials) -> Result<SessionSeed, GatewayFailure> {
        let base_url = ensure_trailing_slash(&credentials.base_url);
        let url = format!(
            "{base_url}{API_ROOT}{}",
            logon_path(credentials.auth_mechanism)
        );

        tracing::info!(
            "Authenticating {} via {} at {url}",
            credentials.username,
            credentials.auth_mechanism
        );

        let mut payload = json!({
            "username": credentials.username,
            "password": credentials.password,
            "concurrentSession": credentials.allow_concurrent_sessions,
        });
        if let Some(new_password) = &credentials.new_password {
            payload["newPassword"] = json!(new_password);
        }

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(GatewayFailure::network)?;

        let status = response.status();
        // The token arrives as a bare string, so the body is read as text
        let body = response.text().await.map_err(GatewayFailure::network)?;

        if !status.is_success() {
            let failure = classify(status, &body);
            tracing::warn!("Authentication failed: {failure}");
            return Err(failure);
        }

        if is_html_body(&body) {
            tracing::warn!(
                "HTML page received instead of a token: {}",
                preview_with_limit(&body, 200)
            );
            return Err(GatewayFailure::unexpected_format(
                "Server returned an HTML page instead of a token. Check the URL and credentials.",
            )
            .with_status(status.as_u16())
            .with_details(preview(&body)));
        }

        let token = sanitize_token(&body);
        if token.is_empty() {
            return Err(GatewayFailure::unexpected_format(
                "Authentication succeeded but the vault returned an empty token",
            )
            .with_status(status.as_u16()));
        }

        tracing::info!(
            "Authenticated {} (token fingerprint {})",
            credentials.username,
            token_fingerprint(&token)
        );

        Ok(SessionSeed::new(
            token,
            base_url,
            credentials.username.clone(),
            Utc::now(),
        ))
    }

    /// Invalidate a token on the vault side. Any 2xx counts as success.
    pub async fn logoff(&self, base_url: &str, token: &str) -> Result<(), GatewayFailure> {
        let url = format!("{}{API_ROOT}{LOGOFF_PATH}", ensure_trailing_slash(base_url));
        tracing::debug!("Logging off token {} at {url}", token_fingerprint(token));

        let response = self
            .client
            .post(&url)
            .header("Authorization", token)
            .send()
            .await
            .map_err(GatewayFailure::network)?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Logged off from {base_url}");
            return Ok(());
        }

        let body = response.text().await.map_err(GatewayFailure::network)?;
        let failure = classify(status, &body);
        tracing::warn!("Logoff failed: {failure}");
        Err(failure)
    }
}
