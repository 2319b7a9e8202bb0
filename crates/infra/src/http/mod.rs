//! HTTP execution
//!
//! [`Fetcher`] runs exactly one request per call, decodes the body,
//! classifies error responses and aborts the request when the shared
//! `"cancel"` event fires while it is outstanding.

mod client;
mod request;
mod response;

use async_trait::async_trait;
use rosterlink_domain::Result;

pub use client::{Fetcher, FetcherBuilder};
pub use request::FetchOptions;
pub use response::FetchResponse;

/// Request execution as consumed by [`crate::Session`]
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Execute one request against `url`
    ///
    /// # Errors
    /// - `InvalidInput` for an empty or unparseable `url` (no I/O)
    /// - `Transport` when the exchange fails at the network level
    /// - `Canceled` when a cancel signal arrives while the request is
    ///   outstanding
    /// - `Fetch` for a recognized server error payload
    /// - `Protocol` for any other error response or malformed JSON
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<FetchResponse>;

    /// Signal cancellation on the next scheduler tick
    ///
    /// Every request outstanding when the signal is delivered fails with
    /// `Canceled`; requests started afterwards are unaffected.
    fn cancel_deferred(&self);
}
