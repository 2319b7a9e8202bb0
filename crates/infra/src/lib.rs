//! # RosterLink Infrastructure
//!
//! Everything that performs I/O.
//!
//! This crate contains:
//! - `Fetcher`: single-request HTTP execution with response classification
//!   and cancellation
//! - `Session`: password-grant authentication, scope discovery, and the
//!   roster / log-upload operations built on it
//! - Configuration loading from environment variables or files
//!
//! ## Architecture
//! - Depends on `rosterlink-domain` for types and errors
//! - Depends on `rosterlink-common` for the event bus and validators
//! - `Session` talks to the network only through the [`http::Fetch`] trait

pub mod config;
pub mod errors;
pub mod http;
pub mod session;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{Fetch, FetchOptions, FetchResponse, Fetcher, FetcherBuilder};
pub use session::Session;
