//! Protocol constants
//!
//! Paths, limits and names shared by the HTTP layer and the session.

// Identity endpoint paths, appended to the configured base endpoint
pub const TOKEN_PATH: &str = "/auth/token";
pub const DISCOVERY_PATH: &str = "/auth/discovery";

// Event bus
pub const CANCEL_EVENT: &str = "cancel";
pub const CANCELED_MESSAGE: &str = "upload canceled";

// Request encoding
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Log upload limits mirrored from the server; both bounds are exclusive
pub const LOG_FILENAME_PLACEHOLDER: &str = "{filename_suffix}";
pub const LOG_FILENAME_MAX_CHARS: usize = 32;
pub const LOG_FILENAME_PATTERN: &str = r"^[a-zA-Z0-9_.\-]*$";
pub const LOG_CONTENT_MAX_BYTES: usize = 128 * 1024 * 1024;

// Credentials
pub const DEFAULT_GRANT_TYPE: &str = "password";
