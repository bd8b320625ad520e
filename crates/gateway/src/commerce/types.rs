//! Wire types for the commerce backend's customer auth API.

use serde::{Deserialize, Serialize};

/// Body of the email/password login and registration endpoints.
#[derive(Serialize)]
pub struct EmailPassRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of the login and registration endpoints.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message from a raw response body.
    pub fn message_from(raw: &str) -> String {
        let parsed: Self = serde_json::from_str(raw).unwrap_or_default();
        match (parsed.message, parsed.kind) {
            (Some(message), Some(kind)) => format!("{kind}: {message}"),
            (Some(message), None) => message,
            _ => raw.chars().take(MAX_RAW_MESSAGE).collect(),
        }
    }
}

/// Longest slice of an unparseable error body kept for logs.
const MAX_RAW_MESSAGE: usize = 200;
