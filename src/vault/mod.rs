pub mod auth;
pub mod catalog;
pub mod client;
pub mod credentials;
pub mod response;
pub mod session;
pub mod token;

use reqwest::{redirect, Client};
use std::time::Duration;

use credentials::AuthMechanism;

/// Every downstream path is rooted here, relative to the instance base URL
pub const API_ROOT: &str = "PasswordVault/API/";

pub const LOGOFF_PATH: &str = "auth/Logoff";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Logon path, relative to `API_ROOT`, for an authentication mechanism
pub fn logon_path(mechanism: AuthMechanism) -> &'static str {
    match mechanism {
        AuthMechanism::Vault => "auth/CYBERARK/Logon",
        AuthMechanism::Ldap => "auth/LDAP/Logon",
        AuthMechanism::Windows => "auth/Windows/Logon",
        AuthMechanism::Radius => "auth/RADIUS/Logon",
    }
}

/// Append a `/` unless the URL already ends with one
pub fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Create the HTTP client used for every vault call.
///
/// Redirects are not followed so that a bounce to a web login page is seen
/// as a 301/302 instead of a 200 carrying HTML.
pub fn create_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::none())
        .use_rustls_tls()
        .build()
}
