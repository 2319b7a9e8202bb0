//! Scope catalog
//!
//! Maps each capability the client uses to the discovery key the server
//! expects. Supplied as configuration and never mutated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Capability exposed through discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AccountInfo,
    UserInfo,
    Information,
    Roster,
    LogUpload,
}

impl Capability {
    pub const ALL: [Self; 5] =
        [Self::AccountInfo, Self::UserInfo, Self::Information, Self::Roster, Self::LogUpload];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccountInfo => "account_info",
            Self::UserInfo => "userinfo",
            Self::Information => "information",
            Self::Roster => "roster",
            Self::LogUpload => "log_upload",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discovery keys per capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeCatalog {
    pub account_info: String,
    pub userinfo: String,
    pub information: String,
    pub roster: String,
    pub log_upload: String,
}

impl ScopeCatalog {
    #[must_use]
    pub fn new(
        account_info: impl Into<String>,
        userinfo: impl Into<String>,
        information: impl Into<String>,
        roster: impl Into<String>,
        log_upload: impl Into<String>,
    ) -> Self {
        Self {
            account_info: account_info.into(),
            userinfo: userinfo.into(),
            information: information.into(),
            roster: roster.into(),
            log_upload: log_upload.into(),
        }
    }

    /// Discovery key for `capability`
    pub fn key(&self, capability: Capability) -> &str {
        match capability {
            Capability::AccountInfo => &self.account_info,
            Capability::UserInfo => &self.userinfo,
            Capability::Information => &self.information,
            Capability::Roster => &self.roster,
            Capability::LogUpload => &self.log_upload,
        }
    }

    /// Capabilities whose discovery key is empty
    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL.into_iter().filter(|cap| self.key(*cap).is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_maps_each_capability() {
        let catalog = ScopeCatalog::new("acct", "user", "info", "roster", "logs");

        assert_eq!(catalog.key(Capability::AccountInfo), "acct");
        assert_eq!(catalog.key(Capability::UserInfo), "user");
        assert_eq!(catalog.key(Capability::Information), "info");
        assert_eq!(catalog.key(Capability::Roster), "roster");
        assert_eq!(catalog.key(Capability::LogUpload), "logs");
        assert!(catalog.missing().is_empty());
    }

    #[test]
    fn missing_lists_empty_keys() {
        let catalog = ScopeCatalog::new("acct", "", "info", "", "logs");
        assert_eq!(catalog.missing(), vec![Capability::UserInfo, Capability::Roster]);
    }
}
