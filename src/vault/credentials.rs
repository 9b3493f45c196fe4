use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Authentication mechanisms offered by the vault's logon API
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMechanism {
    /// Vault-native users
    #[default]
    #[value(alias = "cyberark")]
    #[serde(alias = "CyberArk", alias = "Cyberark", alias = "vault")]
    Vault,
    #[serde(rename = "LDAP", alias = "ldap")]
    Ldap,
    #[serde(alias = "windows")]
    Windows,
    #[serde(rename = "RADIUS", alias = "radius")]
    Radius,
}

impl AuthMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMechanism::Vault => "Vault",
            AuthMechanism::Ldap => "LDAP",
            AuthMechanism::Windows => "Windows",
            AuthMechanism::Radius => "RADIUS",
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMechanism {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vault" | "cyberark" => Ok(AuthMechanism::Vault),
            "ldap" => Ok(AuthMechanism::Ldap),
            "windows" => Ok(AuthMechanism::Windows),
            "radius" => Ok(AuthMechanism::Radius),
            other => Err(format!(
                "unknown authentication mechanism '{other}' (expected Vault, LDAP, Windows or RADIUS)"
            )),
        }
    }
}

/// Unvalidated login input as typed by the user or posted by a client
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "authType")]
    pub auth_mechanism: Option<String>,
    #[serde(default, alias = "concurrentSession")]
    pub allow_concurrent_sessions: Option<bool>,
    #[serde(default)]
    pub new_password: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_mechanism", &self.auth_mechanism)
            .field("allow_concurrent_sessions", &self.allow_concurrent_sessions)
            .field("new_password", &self.new_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Login input that passed validation; lives only for the duration of a login call
#[derive(Clone)]
pub struct Credentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub auth_mechanism: AuthMechanism,
    pub allow_concurrent_sessions: bool,
    pub new_password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_mechanism", &self.auth_mechanism)
            .field("allow_concurrent_sessions", &self.allow_concurrent_sessions)
            .finish()
    }
}

impl Credentials {
    /// Keep what may be displayed after login; the passwords are dropped here
    pub fn into_profile(self) -> LoginProfile {
        LoginProfile {
            base_url: self.base_url,
            username: self.username,
            auth_mechanism: self.auth_mechanism,
            allow_concurrent_sessions: self.allow_concurrent_sessions,
        }
    }
}

/// Credentials minus secrets, retained for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginProfile {
    pub base_url: String,
    pub username: String,
    pub auth_mechanism: AuthMechanism,
    pub allow_concurrent_sessions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|error| error.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Check the shape of login input. Pure; nothing here touches the network.
pub fn validate(request: LoginRequest) -> Result<Credentials, ValidationErrors> {
    let mut fields = Vec::new();

    let base_url = request.base_url.trim().to_string();
    if base_url.is_empty() {
        fields.push(FieldError {
            field: "baseUrl",
            message: "must not be empty".to_string(),
        });
    } else if let Err(message) = check_absolute_url(&base_url) {
        fields.push(FieldError {
            field: "baseUrl",
            message,
        });
    }

    if request.username.is_empty() {
        fields.push(FieldError {
            field: "username",
            message: "must not be empty".to_string(),
        });
    }

    if request.password.is_empty() {
        fields.push(FieldError {
            field: "password",
            message: "must not be empty".to_string(),
        });
    }

    let auth_mechanism = match request.auth_mechanism.as_deref() {
        None => AuthMechanism::default(),
        Some(raw) => match raw.parse::<AuthMechanism>() {
            Ok(mechanism) => mechanism,
            Err(message) => {
                fields.push(FieldError {
                    field: "authMechanism",
                    message,
                });
                AuthMechanism::default()
            }
        },
    };

    if !fields.is_empty() {
        return Err(ValidationErrors { fields });
    }

    Ok(Credentials {
        base_url,
        username: request.username,
        password: request.password,
        auth_mechanism,
        allow_concurrent_sessions: request.allow_concurrent_sessions.unwrap_or(false),
        new_password: request.new_password.filter(|value| !value.is_empty()),
    })
}

fn check_absolute_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("not an absolute URL ({e})"))?;
    if url.cannot_be_a_base() {
        return Err("not a hierarchical URL".to_string());
    }
    Ok(())
}
