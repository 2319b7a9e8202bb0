//! Domain types and models

pub mod credentials;
pub mod scopes;
pub mod tokens;

pub use credentials::Credentials;
pub use scopes::{Capability, ScopeCatalog};
pub use tokens::{AuthInfo, ScopeResolution};
