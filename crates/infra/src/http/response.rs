use reqwest::StatusCode;
use rosterlink_domain::{FetchError, Result, RosterLinkError};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Longest slice of an unrecognized error body quoted in a protocol error
const BODY_EXCERPT_CHARS: usize = 200;

/// Decoded body of a successful response
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    /// Body of a response whose content type mentions `json`
    Json(Value),
    /// Any other body, verbatim
    Text(String),
}

impl FetchResponse {
    /// Decode `text` according to the response `content_type`
    ///
    /// # Errors
    /// Returns `RosterLinkError::Protocol` when the content type announces
    /// JSON but the body does not parse.
    pub(crate) fn decode(content_type: &str, text: String) -> Result<Self> {
        if !content_type.contains("json") {
            return Ok(Self::Text(text));
        }

        serde_json::from_str(&text)
            .map(Self::Json)
            .map_err(|e| RosterLinkError::Protocol(format!("malformed JSON body: {e}")))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    /// Deserialize a JSON body into `T`
    ///
    /// # Errors
    /// Returns `RosterLinkError::Protocol` for a text body or a JSON body
    /// that does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Json(value) => serde_json::from_value(value)
                .map_err(|e| RosterLinkError::Protocol(format!("unexpected response shape: {e}"))),
            Self::Text(_) => Err(RosterLinkError::Protocol("expected a JSON response".into())),
        }
    }
}

/// Map an error response (status >= 400) to a domain error
///
/// Two payload shapes are recognized:
/// - `{"error": code, "error_description": message}`
/// - `{"errors": [{"message_id": code, "message": message}, ...]}`, where
///   only the first entry is reported
///
/// A missing message becomes an empty string. Anything else is a protocol
/// violation, never a [`FetchError`].
pub(crate) fn classify_error(status: StatusCode, body: &FetchResponse) -> RosterLinkError {
    let json = match body {
        FetchResponse::Json(json) => json,
        FetchResponse::Text(text) => {
            return RosterLinkError::Protocol(format!(
                "HTTP {status} with non-JSON error body: {}",
                excerpt(text)
            ));
        }
    };

    if let Some(Value::String(code)) = json.get("error") {
        let message = string_field(json, "error_description");
        return FetchError::new(message, code.clone()).into();
    }

    if let Some(Value::Array(entries)) = json.get("errors") {
        if let Some(first) = entries.first() {
            if let Some(Value::String(code)) = first.get("message_id") {
                return FetchError::new(string_field(first, "message"), code.clone()).into();
            }
        }
    }

    RosterLinkError::Protocol(format!(
        "HTTP {status} with unrecognized error body: {}",
        excerpt(&json.to_string())
    ))
}

fn string_field(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn excerpt(text: &str) -> String {
    text.chars().take(BODY_EXCERPT_CHARS).collect()
}
