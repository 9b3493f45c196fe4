//! Login, logout and forwarding for one logical user.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::utils::errors::GatewayFailure;
use crate::vault::auth::VaultAuth;
use crate::vault::client::{ProxyResult, QueryParams, QueryValue, VaultClient, BASE_URL_PARAM};
use crate::vault::credentials::{self, LoginProfile, LoginRequest};
use crate::vault::session::{Session, SessionHolder};

pub struct Gateway {
    auth: VaultAuth,
    client: VaultClient,
    holder: SessionHolder,
    profile: Option<LoginProfile>,
}

impl Gateway {
    pub fn new(http: Client) -> Self {
        Self {
            auth: VaultAuth::new(http.clone()),
            client: VaultClient::new(http),
            holder: SessionHolder::new(),
            profile: None,
        }
    }

    /// Resume with a previously stored session
    pub fn restore(&mut self, session: Session, profile: Option<LoginProfile>) {
        self.holder.set(session);
        self.profile = profile;
    }

    pub fn session(&self) -> Option<&Session> {
        self.holder.current()
    }

    pub fn profile(&self) -> Option<&LoginProfile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.holder.is_authenticated()
    }

    /// Validate input, log on and hold the resulting session.
    ///
    /// A failed login leaves any previously held session untouched.
    pub async fn login(&mut self, request: LoginRequest) -> Result<&Session, GatewayFailure> {
        let credentials = credentials::validate(request)?;
        let seed = self.auth.acquire(&credentials).await?;

        self.profile = Some(credentials.into_profile());
        self.holder.set(seed);
        self.holder
            .current()
            .ok_or_else(|| GatewayFailure::unauthenticated("Session was not retained"))
    }

    /// Log off downstream, then clear the local session whatever the outcome
    pub async fn logout(&mut self) -> Result<(), GatewayFailure> {
        let outcome = match self.holder.current() {
            Some(session) => self.auth.logoff(&session.base_url, &session.token).await,
            None => Ok(()),
        };

        self.holder.clear();
        self.profile = None;
        outcome
    }

    /// Forward a read to the vault with the held session.
    ///
    /// The session's base URL is supplied as `baseUrl` unless the caller names
    /// another instance. Expired sessions are refused without a network call.
    pub async fn forward(&self, logical_path: &[String], params: &QueryParams) -> ProxyResult {
        let session = self
            .holder
            .current()
            .ok_or_else(|| GatewayFailure::unauthenticated("Not authenticated (no session)"))?;

        if session.is_expired() {
            tracing::warn!("Session for {} expired at {}", session.username, session.expires_at);
            return Err(GatewayFailure::unauthenticated(format!(
                "Session expired at {}. Please login again.",
                session.expires_at.to_rfc3339()
            )));
        }

        let mut params = params.clone();
        if !params.contains_key(BASE_URL_PARAM) {
            params.insert(
                BASE_URL_PARAM.to_string(),
                QueryValue::Text(session.base_url.clone()),
            );
        }

        self.client.forward(session, logical_path, &params).await
    }
}

/// Reply to a login, in the shape UI callers expect
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GatewayFailure>,
}

impl From<Result<&Session, GatewayFailure>> for LoginOutcome {
    fn from(result: Result<&Session, GatewayFailure>) -> Self {
        match result {
            Ok(session) => Self {
                success: true,
                token: Some(session.token.clone()),
                expires_at: Some(session.expires_at),
                error: None,
            },
            Err(failure) => Self {
                success: false,
                token: None,
                expires_at: None,
                error: Some(failure),
            },
        }
    }
}

/// Reply to a logout or a forwarded call
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GatewayFailure>,
}

impl From<Result<(), GatewayFailure>> for Outcome {
    fn from(result: Result<(), GatewayFailure>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                data: None,
                error: None,
            },
            Err(failure) => Self {
                success: false,
                data: None,
                error: Some(failure),
            },
        }
    }
}

impl From<ProxyResult> for Outcome {
    fn from(result: ProxyResult) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(failure) => Self {
                success: false,
                data: None,
                error: Some(failure),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::ErrorKind;

    #[test]
    fn test_login_outcome_shape() {
        let session = Session::new(
            "tok".to_string(),
            "https://v/".to_string(),
            "op".to_string(),
            Utc::now(),
        );
        let json = serde_json::to_value(LoginOutcome::from(Ok(&session))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["token"], "tok");
        assert!(json.get("error").is_none());

        let failed = LoginOutcome::from(Err(GatewayFailure::unauthenticated("bad password")));
        let json = serde_json::to_value(failed).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["kind"], "UNAUTHENTICATED");
        assert!(json.get("token").is_none());
    }

    #[tokio::test]
    async fn test_forward_without_session_is_unauthenticated() {
        let gateway = Gateway::new(Client::new());
        let failure = gateway
            .forward(&["Accounts".to_string()], &QueryParams::new())
            .await
            .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn test_invalid_login_input_never_leaves_validation() {
        let mut gateway = Gateway::new(Client::new());
        let failure = gateway
            .login(LoginRequest::default())
            .await
            .map(|_| ())
            .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Validation);
        assert!(!gateway.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_without_session_is_noop() {
        let mut gateway = Gateway::new(Client::new());
        assert!(gateway.logout().await.is_ok());
        assert!(!gateway.is_authenticated());
    }
}
