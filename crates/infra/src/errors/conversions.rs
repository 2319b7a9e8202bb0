//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rosterlink_common::ValidationError;
use rosterlink_domain::RosterLinkError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RosterLinkError);

impl From<InfraError> for RosterLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RosterLinkError> for InfraError {
    fn from(value: RosterLinkError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRosterLinkError {
    fn into_rosterlink(self) -> RosterLinkError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RosterLinkError */
/* -------------------------------------------------------------------------- */

impl IntoRosterLinkError for HttpError {
    fn into_rosterlink(self) -> RosterLinkError {
        if self.is_builder() {
            return RosterLinkError::InvalidInput(format!("invalid request: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return RosterLinkError::Transport("HTTP connection failure".into());
        }

        if self.is_body() || self.is_decode() {
            return RosterLinkError::Transport(format!("failed to read response body: {self}"));
        }

        RosterLinkError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_rosterlink())
    }
}

/* -------------------------------------------------------------------------- */
/* ValidationError → RosterLinkError */
/* -------------------------------------------------------------------------- */

impl IntoRosterLinkError for ValidationError {
    fn into_rosterlink(self) -> RosterLinkError {
        RosterLinkError::InvalidInput(self.to_string())
    }
}

impl From<ValidationError> for InfraError {
    fn from(value: ValidationError) -> Self {
        InfraError(value.into_rosterlink())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
