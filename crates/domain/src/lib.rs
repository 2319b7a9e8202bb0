//! # RosterLink Domain
//!
//! Domain types and models for RosterLink.
//!
//! This crate contains:
//! - Credential, token and scope-resolution types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Protocol constants (paths, limits, event names)
//!
//! ## Architecture
//! - No dependencies on other RosterLink crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
