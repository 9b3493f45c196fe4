use ordermap::OrderMap;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use url::Url;

use super::response::classify;
use super::session::Session;
use super::token::{is_html_body, preview, preview_with_limit, token_fingerprint};
use super::{ensure_trailing_slash, API_ROOT};
use crate::utils::errors::{ErrorKind, GatewayFailure};

/// Query parameter naming the vault instance; consumed here, never forwarded
pub const BASE_URL_PARAM: &str = "baseUrl";

/// Outcome of a proxied call: the parsed payload or a classified failure
pub type ProxyResult = Result<Value, GatewayFailure>;

/// A query parameter value as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl QueryValue {
    /// Infer the value type from command-line text: booleans, then numbers, then text
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => return QueryValue::Bool(true),
            "false" => return QueryValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = raw.parse::<i64>() {
            return QueryValue::Number(n.into());
        }
        if let Some(n) = raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return QueryValue::Number(n);
        }
        QueryValue::Text(raw.to_string())
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Bool(b) => write!(f, "{b}"),
            QueryValue::Number(n) => write!(f, "{n}"),
            QueryValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Number(value.into())
    }
}

/// Query parameters in caller order
pub type QueryParams = OrderMap<String, QueryValue>;

/// Build the downstream URL for a logical path.
///
/// `baseUrl` is taken out of `params`; every other parameter is carried over.
pub fn build_downstream_url(
    logical_path: &[String],
    params: &QueryParams,
) -> Result<Url, GatewayFailure> {
    let base_url = params
        .get(BASE_URL_PARAM)
        .map(|value| value.to_string())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| GatewayFailure::bad_request("Base URL is required (baseUrl parameter)"))?;

    let segments: Vec<&str> = logical_path
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        return Err(GatewayFailure::bad_request("Logical path is empty"));
    }
    if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
        return Err(GatewayFailure::bad_request(format!(
            "Path segment '{segment}' is not allowed"
        )));
    }

    let root = format!("{}{API_ROOT}", ensure_trailing_slash(base_url.trim()));
    let mut url = Url::parse(&root)
        .map_err(|e| GatewayFailure::bad_request(format!("Invalid base URL '{base_url}': {e}")))?;

    // Each segment is percent-encoded on its own, so '/', '?' and '#' stay inside it
    url.path_segments_mut()
        .map_err(|_| GatewayFailure::bad_request(format!("Invalid base URL '{base_url}'")))?
        .pop_if_empty()
        .extend(segments);

    let forwarded: Vec<(&String, &QueryValue)> = params
        .iter()
        .filter(|(key, _)| key.as_str() != BASE_URL_PARAM)
        .collect();
    if !forwarded.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in forwarded {
            pairs.append_pair(key, &value.to_string());
        }
    }

    Ok(url)
}

/// Forwards read operations to the vault on behalf of a session
pub struct VaultClient {
    client: Client,
}

impl VaultClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Issue one GET for `logical_path` with the session token attached.
    ///
    /// An empty token fails before anything is sent.
    pub async fn forward(
        &self,
        session: &Session,
        logical_path: &[String],
        params: &QueryParams,
    ) -> ProxyResult {
        if session.token.trim().is_empty() {
            return Err(GatewayFailure::unauthenticated(
                "Not authenticated (missing token)",
            ));
        }

        let url = build_downstream_url(logical_path, params)?;
        tracing::info!("Forwarding GET {url}");
        tracing::debug!("Using token fingerprint {}", token_fingerprint(&session.token));

        // The vault expects the raw token, without an auth scheme
        let response = self
            .client
            .get(url)
            .header("Authorization", session.token.as_str())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(GatewayFailure::network)?;

        let status = response.status();
        tracing::debug!("Response status: {status}");
        let body = response.text().await.map_err(GatewayFailure::network)?;

        interpret(status, &body)
    }
}

/// Map a downstream status and raw body to a proxy result
pub fn interpret(status: StatusCode, body: &str) -> ProxyResult {
    if is_html_body(body) {
        return Err(classify(status, body));
    }

    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("Vault rejected the token: {}", preview_with_limit(body, 200));
        return Err(
            GatewayFailure::unauthenticated("Not authenticated (401 from vault)")
                .with_status(status.as_u16())
                .with_details(preview(body)),
        );
    }

    if !status.is_success() {
        return Err(classify(status, body));
    }

    serde_json::from_str::<Value>(body).map_err(|e| {
        tracing::warn!("Invalid JSON from vault ({e}): {}", preview_with_limit(body, 200));
        GatewayFailure::new(
            ErrorKind::UnexpectedFormat,
            "Server answered with an invalid format. Check the URL and authentication.",
        )
        .with_status(status.as_u16())
        .with_details(preview(body))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn params(pairs: &[(&str, QueryValue)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_url_excludes_base_url_param() {
        let url = build_downstream_url(
            &path(&["Accounts"]),
            &params(&[
                ("baseUrl", "https://x".into()),
                ("limit", 5i64.into()),
                ("search", "root admin".into()),
            ]),
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://x/PasswordVault/API/Accounts?limit=5&search=root+admin"
        );
    }

    #[test]
    fn test_url_without_extra_params_has_no_query() {
        let url = build_downstream_url(
            &path(&["Safes", "Finance", "Members"]),
            &params(&[("baseUrl", "https://vault.local/".into())]),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://vault.local/PasswordVault/API/Safes/Finance/Members"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn test_missing_base_url_is_bad_request() {
        let failure = build_downstream_url(&path(&["Accounts"]), &QueryParams::new()).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::BadRequest);

        let failure = build_downstream_url(
            &path(&["Accounts"]),
            &params(&[("baseUrl", "  ".into())]),
        )
        .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn test_empty_logical_path_is_bad_request() {
        let failure = build_downstream_url(
            &path(&["", "/"]),
            &params(&[("baseUrl", "https://x".into())]),
        )
        .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        let cases: [&[&str]; 3] = [&["Safes", "../../../admin"], &["..", "admin"], &["Safes", "."]];
        for traversal in cases {
            let failure = build_downstream_url(
                &path(traversal),
                &params(&[("baseUrl", "https://x".into()), ("limit", 5i64.into())]),
            )
            .unwrap_err();
            assert_eq!(failure.kind, ErrorKind::BadRequest, "{traversal:?}");
        }
    }

    #[test]
    fn test_reserved_characters_stay_in_their_segment() {
        let base = params(&[("baseUrl", "https://x".into()), ("limit", 5i64.into())]);

        let url = build_downstream_url(&path(&["Safes", "A#B"]), &base).unwrap();
        assert_eq!(url.path(), "/PasswordVault/API/Safes/A%23B");
        assert!(url.fragment().is_none());

        let url = build_downstream_url(&path(&["Safes", "A?x=1"]), &base).unwrap();
        assert_eq!(url.path(), "/PasswordVault/API/Safes/A%3Fx=1");
        assert_eq!(url.query(), Some("limit=5"));

        let url = build_downstream_url(&path(&["Safes", "a/b", "Members"]), &base).unwrap();
        assert_eq!(url.path(), "/PasswordVault/API/Safes/a%2Fb/Members");
    }

    #[test]
    fn test_base_url_path_is_kept() {
        let url = build_downstream_url(
            &path(&["Users"]),
            &params(&[("baseUrl", "https://x/pvwa".into())]),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://x/pvwa/PasswordVault/API/Users");
    }

    #[test]
    fn test_query_value_inference() {
        assert_eq!(QueryValue::infer("true"), QueryValue::Bool(true));
        assert_eq!(QueryValue::infer("25"), QueryValue::Number(25i64.into()));
        assert_eq!(QueryValue::infer("0.5").to_string(), "0.5");
        assert_eq!(QueryValue::infer("NaN"), QueryValue::Text("NaN".to_string()));
        assert_eq!(QueryValue::infer("safe01"), QueryValue::Text("safe01".to_string()));
    }

    #[test]
    fn test_interpret_outcomes() {
        let ok = interpret(StatusCode::OK, r#"{"value":[],"count":0}"#).unwrap();
        assert_eq!(ok["count"], 0);

        let failure = interpret(StatusCode::OK, "not json{").unwrap_err();
        assert_eq!(failure.kind, ErrorKind::UnexpectedFormat);

        let failure = interpret(StatusCode::UNAUTHORIZED, &"e".repeat(900)).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Unauthenticated);
        assert_eq!(failure.details.map(|d| d.len()), Some(500));

        let failure = interpret(StatusCode::UNAUTHORIZED, "<!DOCTYPE html><p>login</p>").unwrap_err();
        assert_eq!(failure.kind, ErrorKind::UnexpectedFormat);

        let failure = interpret(StatusCode::FORBIDDEN, r#"{"ErrorMessage":"no access"}"#).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::RemoteError);
        assert_eq!(failure.message, "no access");
    }
}
