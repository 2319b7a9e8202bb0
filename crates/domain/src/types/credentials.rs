//! Password-grant credentials
//!
//! Credentials are immutable once built. `Debug` output redacts the client
//! secret and the password.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_GRANT_TYPE;
use crate::errors::{Result, RosterLinkError};

/// Resource-owner password credentials sent to the token endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    scope: Vec<String>,
    #[serde(default = "default_grant_type")]
    grant_type: String,
}

fn default_grant_type() -> String {
    DEFAULT_GRANT_TYPE.to_string()
}

const STRING_FIELDS: [&str; 5] =
    ["client_id", "client_secret", "username", "password", "grant_type"];

impl Credentials {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        scope: Vec<String>,
        grant_type: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            scope,
            grant_type: grant_type.into(),
        }
    }

    /// Build credentials from an untyped JSON object
    ///
    /// Every required field must be present and of the right type: strings
    /// for `client_id`, `client_secret`, `username`, `password` and
    /// `grant_type`, an array of strings for `scope`. All problems are
    /// reported together.
    ///
    /// # Errors
    /// Returns `RosterLinkError::InvalidInput` listing each missing or
    /// wrong-typed field.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(RosterLinkError::InvalidInput("credentials should be an object".into()));
        };

        let mut problems = Vec::new();

        for field in STRING_FIELDS {
            match object.get(field) {
                None | Some(Value::Null) => problems.push(format!("{field} is required")),
                Some(Value::String(_)) => {}
                Some(_) => problems.push(format!("{field} should be string")),
            }
        }

        match object.get("scope") {
            None | Some(Value::Null) => problems.push("scope is required".to_string()),
            Some(Value::Array(items)) => {
                if !items.iter().all(Value::is_string) {
                    problems.push("scope should be array of strings".to_string());
                }
            }
            Some(_) => problems.push("scope should be array".to_string()),
        }

        if !problems.is_empty() {
            return Err(RosterLinkError::InvalidInput(problems.join("; ")));
        }

        serde_json::from_value(value.clone())
            .map_err(|e| RosterLinkError::InvalidInput(format!("credentials: {e}")))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn grant_type(&self) -> &str {
        &self.grant_type
    }

    /// Scopes joined by single spaces, as the token endpoint expects
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scope.join(" ")
    }

    /// Token request form fields, in wire order
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone()),
            ("username", self.username.clone()),
            ("password", self.password.clone()),
            ("scope", self.scope_string()),
            ("grant_type", self.grant_type.clone()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scope", &self.scope)
            .field("grant_type", &self.grant_type)
            .finish()
    }
}
