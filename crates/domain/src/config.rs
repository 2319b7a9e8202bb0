//! Client configuration structures

use serde::{Deserialize, Serialize};

use crate::types::{Credentials, ScopeCatalog};

/// Everything needed to build a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Identity server base URL, e.g. `https://id.example.com`
    pub endpoint: String,
    pub credentials: Credentials,
    pub scopes: ScopeCatalog,
}
