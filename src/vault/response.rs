//! Classification of unsuccessful vault responses.

use reqwest::StatusCode;
use serde_json::Value;

use super::token::{is_html_body, preview};
use crate::utils::errors::{ErrorKind, GatewayFailure};

/// Fields the vault (or a fronting gateway) uses to carry an error message
const MESSAGE_FIELDS: [&str; 4] = ["message", "error", "ErrorMessage", "Details"];

/// Turn a non-success status and its raw body into a classified failure.
///
/// Rules apply in order: an HTML page wins over everything, then redirects,
/// then a JSON message, then unparseable bodies, then a generic status message.
pub fn classify(status: StatusCode, body: &str) -> GatewayFailure {
    let failure = if is_html_body(body) {
        GatewayFailure::unexpected_format(
            "Server returned a page instead of data. Check the URL and authentication.",
        )
        .with_details(preview(body))
    } else if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
        GatewayFailure::new(
            ErrorKind::SessionExpiredOrRedirected,
            format!(
                "Redirect detected ({}). The session has probably expired.",
                status.as_u16()
            ),
        )
    } else {
        match serde_json::from_str::<Value>(body) {
            Ok(json) => {
                let message =
                    extract_message(&json).unwrap_or_else(|| generic_status_message(status));
                GatewayFailure::new(ErrorKind::RemoteError, message).with_details(preview(body))
            }
            Err(_) => GatewayFailure::unexpected_format(format!(
                "Non-JSON response ({})",
                status.as_u16()
            ))
            .with_details(preview(body)),
        }
    };

    tracing::debug!(
        "Classified {} response as {:?}: {}",
        status.as_u16(),
        failure.kind,
        failure.message
    );

    failure.with_status(status.as_u16())
}

/// First non-empty message field of a JSON error body
pub fn extract_message(json: &Value) -> Option<String> {
    let object = json.as_object()?;
    MESSAGE_FIELDS.iter().find_map(|field| {
        object
            .get(*field)
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    })
}

fn generic_status_message(status: StatusCode) -> String {
    format!(
        "Error {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown status")
    )
}
