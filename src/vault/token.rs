//! Token normalization and body inspection helpers shared by login and proxying.

use sha2::{Digest, Sha256};

/// Longest slice of a downstream body ever carried in a failure or a log line
pub const MAX_PREVIEW_CHARS: usize = 500;

const BEARER_PREFIX: &str = "Bearer ";

/// Normalize a raw token: drop one layer of enclosing double quotes, a leading
/// `Bearer ` scheme and surrounding whitespace.
///
/// Passes repeat until the value stops changing, so `sanitize_token` is
/// idempotent for every input.
pub fn sanitize_token(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_once(raw: &str) -> String {
    let mut token = raw.trim();

    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        token = token[1..token.len() - 1].trim();
    }

    if let Some(stripped) = token.strip_prefix(BEARER_PREFIX) {
        token = stripped;
    }

    token.trim().to_string()
}

/// True when a body looks like a web page rather than API data
pub fn is_html_body(body: &str) -> bool {
    let trimmed = body.trim_start();
    starts_with_ignore_case(trimmed, "<!doctype") || starts_with_ignore_case(trimmed, "<html")
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Truncate a body to `MAX_PREVIEW_CHARS` characters
pub fn preview(body: &str) -> String {
    preview_with_limit(body, MAX_PREVIEW_CHARS)
}

pub fn preview_with_limit(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

/// Short SHA-256 fingerprint used to identify a token in logs
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize_token("\"abc\""), "abc");
        assert_eq!(sanitize_token("Bearer xyz "), "xyz");
        assert_eq!(sanitize_token(" plain "), "plain");
        assert_eq!(sanitize_token("\"Bearer quoted\"\n"), "quoted");
    }

    #[test]
    fn test_sanitize_keeps_lone_quote() {
        assert_eq!(sanitize_token("\""), "\"");
        assert_eq!(sanitize_token(""), "");
    }

    #[test]
    fn test_sanitize_only_strips_exact_scheme() {
        // Lowercase scheme is not the vault's convention and stays part of the token
        assert_eq!(sanitize_token("bearer abc"), "bearer abc");
        assert_eq!(sanitize_token("Bearerabc"), "Bearerabc");
    }

    #[test]
    fn test_html_detection() {
        assert!(is_html_body("<!DOCTYPE html><html></html>"));
        assert!(is_html_body("  \n<html lang=\"en\">"));
        assert!(is_html_body("<!doctype html>"));
        assert!(!is_html_body("{\"ok\":true}"));
        assert!(!is_html_body("<h"));
        assert!(!is_html_body(""));
    }

    #[test]
    fn test_preview_is_char_bounded() {
        let body = "é".repeat(600);
        let cut = preview(&body);
        assert_eq!(cut.chars().count(), MAX_PREVIEW_CHARS);
        assert_eq!(preview_with_limit("short", 100), "short");
    }

    #[test]
    fn test_fingerprint_does_not_leak_token() {
        let fingerprint = token_fingerprint("secret-token-value");
        assert_eq!(fingerprint.len(), 12);
        assert!(!fingerprint.contains("secret"));
        assert_eq!(fingerprint, token_fingerprint("secret-token-value"));
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(raw in any::<String>()) {
            let once = sanitize_token(&raw);
            prop_assert_eq!(sanitize_token(&once), once);
        }

        #[test]
        fn sanitize_recovers_wrapped_token(
            core in "[A-Za-z0-9_.=-]{1,40}",
            quoted in any::<bool>(),
            bearer in any::<bool>(),
            pad in "[ \t\n]{0,3}",
        ) {
            let mut wrapped = core.clone();
            if bearer {
                wrapped = format!("Bearer {wrapped}");
            }
            if quoted {
                wrapped = format!("\"{wrapped}\"");
            }
            wrapped = format!("{pad}{wrapped}{pad}");

            prop_assert_eq!(sanitize_token(&wrapped), core);
        }
    }
}
