//! Input checks run before any request is issued

use once_cell::sync::Lazy;
use regex::Regex;
use rosterlink_common::{
    CollectionValidator, StringValidator, ValidationError, ValidationResult, Validator,
};
use rosterlink_domain::constants::{
    LOG_CONTENT_MAX_BYTES, LOG_FILENAME_MAX_CHARS, LOG_FILENAME_PATTERN,
};
use rosterlink_domain::{Capability, Credentials, ScopeCatalog};

static LOG_FILENAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(LOG_FILENAME_PATTERN).expect("LOG_FILENAME_REGEX should compile - this is a bug")
});

/// Endpoint, credential and scope catalog checks for session construction
///
/// Every violation is collected so one error lists all of them.
pub(crate) fn validate_session_input(
    endpoint: &str,
    credentials: &Credentials,
    scopes: &ScopeCatalog,
) -> ValidationResult<()> {
    let required = StringValidator::new().not_empty();
    let scope_list: CollectionValidator<String> =
        CollectionValidator::new().min_size(1).item_validator(StringValidator::new().not_empty());

    let mut validator = Validator::new();
    validator
        .validate_field("endpoint", endpoint, &required)
        .validate_field("client_id", credentials.client_id(), &required)
        .validate_field("client_secret", credentials.client_secret(), &required)
        .validate_field("username", credentials.username(), &required)
        .validate_field("password", credentials.password(), &required)
        .validate_field("scope", credentials.scope(), &scope_list)
        .validate_field("grant_type", credentials.grant_type(), &required);

    for capability in Capability::ALL {
        let field = format!("scopes.{capability}");
        validator.validate_field(&field, scopes.key(capability), &required);
    }

    validator.finalize()
}

/// Log upload limits, checked in order; the first violation is reported
pub(crate) fn validate_log_upload(content: &[u8], filename: &str) -> ValidationResult<()> {
    let filename_rules = StringValidator::new()
        .max_length(LOG_FILENAME_MAX_CHARS - 1)
        .with_regex(LOG_FILENAME_REGEX.clone());

    let mut validator = Validator::new().stop_on_first_error();
    validator
        .validate_not_empty("content", content)
        .validate_not_empty("filename", filename)
        .validate_field("filename", filename, &filename_rules)
        .validate_below("content", content.len(), LOG_CONTENT_MAX_BYTES);

    validator.finalize()
}

/// Reject an empty identifier
pub(crate) fn require(field: &str, value: &str) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::field(field, "is required"));
    }
    Ok(())
}
