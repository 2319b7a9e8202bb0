//! Token endpoint and discovery payloads
//!
//! Both payloads keep every field the server sent; only the fields the
//! client acts on are typed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, RosterLinkError};

/// Payload returned by the token endpoint
///
/// Only `access_token` is interpreted; it becomes the bearer credential for
/// discovery calls. Everything else (`token_type`, `expires_in`, ...) is kept
/// in `extra` as received.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub access_token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthInfo {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), extra: Map::new() }
    }

    /// Decode a token endpoint response
    ///
    /// # Errors
    /// Returns `RosterLinkError::Protocol` unless `value` is an object with a
    /// string `access_token`.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| RosterLinkError::Protocol(format!("malformed token response: {e}")))
    }
}

impl fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInfo")
            .field("access_token", &"<redacted>")
            .field("extra", &self.extra)
            .finish()
    }
}

/// One scope entry of a discovery response
///
/// Never cached: every operation discovers its scope again.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeResolution {
    /// Service endpoint for this scope; may be a template (log upload)
    pub endpoint: String,
    /// Token scoped to this service
    pub access_token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScopeResolution {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), access_token: access_token.into(), extra: Map::new() }
    }

    /// Decode the entry stored under `scope` in a discovery response
    ///
    /// Returns `Ok(None)` when the response has no entry for `scope`.
    ///
    /// # Errors
    /// Returns `RosterLinkError::Protocol` when the response is not an
    /// object, or the entry lacks a string `endpoint` / `access_token`.
    pub fn extract(response: &Value, scope: &str) -> Result<Option<Self>> {
        let Some(object) = response.as_object() else {
            return Err(RosterLinkError::Protocol(
                "discovery response is not a JSON object".to_string(),
            ));
        };

        match object.get(scope) {
            None | Some(Value::Null) => Ok(None),
            Some(entry) => serde_json::from_value(entry.clone()).map(Some).map_err(|e| {
                RosterLinkError::Protocol(format!("malformed discovery entry for {scope}: {e}"))
            }),
        }
    }
}

impl fmt::Debug for ScopeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeResolution")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"<redacted>")
            .field("extra", &self.extra)
            .finish()
    }
}
