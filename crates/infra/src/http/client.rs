use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Request};
use rosterlink_common::EventBus;
use rosterlink_domain::constants::{CANCEL_EVENT, FORM_CONTENT_TYPE};
use rosterlink_domain::{Result, RosterLinkError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::response::{classify_error, FetchResponse};
use super::{Fetch, FetchOptions};
use crate::errors::InfraError;

/// Single-request HTTP executor with cooperative cancellation.
///
/// Cloning is cheap; clones share the connection pool and the event bus, so a
/// cancel emitted through one clone reaches requests issued by any of them.
#[derive(Clone)]
pub struct Fetcher {
    client: ReqwestClient,
    events: Arc<EventBus<()>>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").field("events", &self.events).finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Start building a new fetcher.
    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Event bus carrying the `"cancel"` signal
    pub fn events(&self) -> &Arc<EventBus<()>> {
        &self.events
    }

    /// Emit the cancel event now, inside the caller's stack
    ///
    /// Returns the number of outstanding requests that were signaled.
    pub fn cancel(&self) -> usize {
        let signaled = self.events.emit(CANCEL_EVENT, &());
        debug!(signaled, "cancel emitted");
        signaled
    }

    fn build_request(&self, url: &str, options: FetchOptions) -> Result<Request> {
        let mut builder = self.client.request(options.method, url);

        if let Some(token) = options.access_token {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = options.body {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        }

        builder.build().map_err(|err| RosterLinkError::from(InfraError::from(err)))
    }

    async fn exchange(&self, request: Request) -> Result<FetchResponse> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            RosterLinkError::from(InfraError::from(err))
        })?;

        let status = response.status();
        debug!(%method, %url, %status, "received HTTP response");

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text =
            response.text().await.map_err(|err| RosterLinkError::from(InfraError::from(err)))?;
        let body = FetchResponse::decode(&content_type, text)?;

        if status.as_u16() >= 400 {
            let err = classify_error(status, &body);
            warn!(%method, %url, %status, error = %err, "request rejected by server");
            return Err(err);
        }

        Ok(body)
    }
}

#[async_trait]
impl Fetch for Fetcher {
    #[instrument(skip(self, options), fields(method = %options.method))]
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<FetchResponse> {
        if url.is_empty() {
            return Err(RosterLinkError::InvalidInput("url is required".into()));
        }

        let request = self.build_request(url, options)?;

        let canceled = CancellationToken::new();
        let _listener = {
            let canceled = canceled.clone();
            self.events.subscribe(CANCEL_EVENT, move |_| canceled.cancel())
        };

        tokio::select! {
            biased;
            () = canceled.cancelled() => {
                warn!(url, "request canceled while outstanding");
                Err(RosterLinkError::Canceled)
            }
            result = self.exchange(request) => result,
        }
    }

    fn cancel_deferred(&self) {
        let events = Arc::clone(&self.events);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    let signaled = events.emit(CANCEL_EVENT, &());
                    debug!(signaled, "deferred cancel emitted");
                });
            }
            Err(_) => {
                warn!("no async runtime available; emitting cancel immediately");
                events.emit(CANCEL_EVENT, &());
            }
        }
    }
}

/// Builder for [`Fetcher`].
///
/// Requests carry no timeout and are never retried.
#[derive(Debug, Default)]
pub struct FetcherBuilder {
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
    use_system_proxy: bool,
    events: Option<Arc<EventBus<()>>>,
}

impl FetcherBuilder {
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Add one default header sent with every request.
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.get_or_insert_with(HeaderMap::new).insert(name, value);
        self
    }

    /// Honor proxy settings from the environment (off by default).
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.use_system_proxy = enabled;
        self
    }

    /// Share an existing event bus instead of creating a fresh one.
    pub fn events(mut self, events: Arc<EventBus<()>>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<Fetcher> {
        let mut builder = ReqwestClient::builder();

        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| RosterLinkError::from(InfraError::from(err)))?;

        Ok(Fetcher { client, events: self.events.unwrap_or_default() })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Method;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher() -> Fetcher {
        Fetcher::builder().build().expect("fetcher")
    }

    #[tokio::test]
    async fn empty_url_is_rejected_before_io() {
        let err = fetcher().fetch("", FetchOptions::default()).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn sends_bearer_and_form_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/discovery"))
            .and(header("authorization", "Bearer tok"))
            .and(header("content-type", FORM_CONTENT_TYPE))
            .and(body_string("scope=roster"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let response = fetcher()
            .fetch(
                &format!("{}/auth/discovery", server.uri()),
                FetchOptions::post().bearer("tok").form([("scope", "roster")]),
            )
            .await
            .expect("response");

        assert_eq!(response, FetchResponse::Json(json!({"ok": true})));
    }

    #[tokio::test]
    async fn get_without_body_sends_no_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain"))
            .expect(1)
            .mount(&server)
            .await;

        let response = fetcher().fetch(&server.uri(), FetchOptions::get()).await.expect("response");
        assert_eq!(response.as_text(), Some("plain"));

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("content-type").is_none());
        assert!(requests[0].headers.get("authorization").is_none());
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn user_agent_and_default_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "rosterlink-test"))
            .and(header_exists("x-client"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::builder()
            .user_agent("rosterlink-test")
            .default_header(HeaderName::from_static("x-client"), HeaderValue::from_static("1"))
            .build()
            .expect("fetcher");

        let response = fetcher.fetch(&server.uri(), FetchOptions::get()).await.expect("response");
        assert_eq!(response, FetchResponse::Text(String::new()));
    }

    #[tokio::test]
    async fn error_status_maps_to_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_token",
                "error_description": "expired"
            })))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&server.uri(), FetchOptions::get().method(Method::POST))
            .await
            .unwrap_err();

        let fetch_error = err.fetch_error().expect("fetch error");
        assert_eq!(fetch_error.code, "invalid_token");
        assert_eq!(fetch_error.message, "expired");
    }

    #[tokio::test]
    async fn cancel_aborts_outstanding_request_and_releases_listener() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let task = {
            let fetcher = fetcher.clone();
            let url = server.uri();
            tokio::spawn(async move { fetcher.fetch(&url, FetchOptions::post().body("log")).await })
        };

        while fetcher.events().handler_count(CANCEL_EVENT) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(fetcher.cancel(), 1);

        let err = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("fetch should finish promptly after cancel")
            .expect("task")
            .unwrap_err();

        assert!(err.is_canceled());
        assert_eq!(err.to_string(), "upload canceled");
        assert_eq!(fetcher.events().handler_count(CANCEL_EVENT), 0);
    }

    #[tokio::test]
    async fn cancel_without_outstanding_request_is_noop() {
        let fetcher = fetcher();
        assert_eq!(fetcher.cancel(), 0);
    }

    #[tokio::test]
    async fn listeners_do_not_accumulate_across_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = fetcher();
        for _ in 0..3 {
            fetcher.fetch(&server.uri(), FetchOptions::get()).await.expect("response");
        }

        assert!(fetcher.events().is_empty());
    }

    #[tokio::test]
    async fn deferred_cancel_does_not_fire_synchronously() {
        let fetcher = fetcher();
        let token = CancellationToken::new();
        let _listener = {
            let token = token.clone();
            fetcher.events().subscribe(CANCEL_EVENT, move |_| token.cancel())
        };

        fetcher.cancel_deferred();
        assert!(!token.is_cancelled());

        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("deferred cancel should fire");
    }
}
