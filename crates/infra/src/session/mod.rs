//! Authenticated session against the identity server
//!
//! A [`Session`] owns the endpoint, the credentials and the scope catalog.
//! `auth()` obtains the bearer token; every other operation discovers the
//! scope-specific endpoint first and then talks to it.

mod client;
mod validation;

pub use client::Session;
