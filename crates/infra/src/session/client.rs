use std::sync::Arc;

use parking_lot::RwLock;
use rosterlink_domain::constants::{DISCOVERY_PATH, LOG_FILENAME_PLACEHOLDER, TOKEN_PATH};
use rosterlink_domain::{
    AuthInfo, Capability, ClientConfig, Credentials, Result, RosterLinkError, ScopeCatalog,
    ScopeResolution,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::validation::{require, validate_log_upload, validate_session_input};
use crate::errors::InfraError;
use crate::http::{Fetch, FetchOptions, FetchResponse, Fetcher};

/// Password-grant session with scope discovery
///
/// `auth()` must succeed before any discovery-based operation. The stored
/// token is replaced wholesale by each successful `auth()`; a failed
/// `auth()` leaves the previous one in place.
pub struct Session {
    endpoint: String,
    credentials: Credentials,
    scopes: ScopeCatalog,
    fetcher: Arc<dyn Fetch>,
    auth_info: RwLock<Option<AuthInfo>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("scopes", &self.scopes)
            .field("authenticated", &self.auth_info.read().is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session backed by a default [`Fetcher`]
    ///
    /// # Errors
    /// Returns `RosterLinkError::InvalidInput` when the endpoint, any
    /// credential field or any scope key is missing. Nothing is sent.
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Credentials,
        scopes: ScopeCatalog,
    ) -> Result<Self> {
        Self::with_fetcher(endpoint, credentials, scopes, Arc::new(Fetcher::new()?))
    }

    /// Create a session that issues requests through `fetcher`
    ///
    /// # Errors
    /// Same validation as [`Session::new`].
    pub fn with_fetcher(
        endpoint: impl Into<String>,
        credentials: Credentials,
        scopes: ScopeCatalog,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        validate_session_input(&endpoint, &credentials, &scopes).map_err(InfraError::from)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
            scopes,
            fetcher,
            auth_info: RwLock::new(None),
        })
    }

    /// Create a session from loaded configuration
    ///
    /// # Errors
    /// Same validation as [`Session::new`].
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::new(config.endpoint, config.credentials, config.scopes)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn scopes(&self) -> &ScopeCatalog {
        &self.scopes
    }

    /// Token payload from the last successful `auth()`
    pub fn auth_info(&self) -> Option<AuthInfo> {
        self.auth_info.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_info.read().is_some()
    }

    /// Exchange the credentials for a bearer token
    ///
    /// # Errors
    /// Propagates fetch errors unchanged. A success response without a
    /// string `access_token` is `RosterLinkError::Protocol`.
    #[instrument(skip(self), fields(endpoint = %self.endpoint, username = %self.credentials.username()))]
    pub async fn auth(&self) -> Result<()> {
        let url = format!("{}{TOKEN_PATH}", self.endpoint);
        let options = FetchOptions::post().form(self.credentials.form_fields());

        let response = self.fetcher.fetch(&url, options).await.inspect_err(|err| {
            warn!(error = %err, "authentication failed");
        })?;

        let auth_info = AuthInfo::from_value(expect_json(response, "token")?)?;
        *self.auth_info.write() = Some(auth_info);

        info!("authenticated");
        Ok(())
    }

    /// Resolve the endpoint and token for one scope
    ///
    /// Returns `Ok(None)` when the discovery response has no entry for
    /// `scope`.
    ///
    /// # Errors
    /// - `NotAuthenticated` before a successful `auth()`
    /// - `InvalidInput` for an empty `scope`
    /// - `Protocol` when the entry exists but is malformed
    /// - any fetch error, unchanged
    #[instrument(skip(self))]
    pub async fn discovery(&self, scope: &str) -> Result<Option<ScopeResolution>> {
        require("scope", scope).map_err(InfraError::from)?;

        let access_token = match self.auth_info.read().as_ref() {
            Some(info) => info.access_token.clone(),
            None => return Err(RosterLinkError::NotAuthenticated),
        };

        let url = format!("{}{DISCOVERY_PATH}", self.endpoint);
        let options = FetchOptions::post().bearer(access_token).form([("scope", scope)]);

        let response = self.fetcher.fetch(&url, options).await?;
        let resolution = ScopeResolution::extract(&expect_json(response, "discovery")?, scope)?;

        debug!(found = resolution.is_some(), "discovery completed");
        Ok(resolution)
    }

    /// Account information scope
    ///
    /// # Errors
    /// See [`Session::discovery`].
    pub async fn account_info(&self) -> Result<Option<ScopeResolution>> {
        self.discovery(self.scopes.key(Capability::AccountInfo)).await
    }

    /// User information scope
    ///
    /// # Errors
    /// See [`Session::discovery`].
    pub async fn user_info(&self) -> Result<Option<ScopeResolution>> {
        self.discovery(self.scopes.key(Capability::UserInfo)).await
    }

    /// Information scope
    ///
    /// # Errors
    /// See [`Session::discovery`].
    pub async fn information(&self) -> Result<Option<ScopeResolution>> {
        self.discovery(self.scopes.key(Capability::Information)).await
    }

    /// List the signed-in user's rosters
    ///
    /// # Errors
    /// `ScopeUnavailable` when discovery has no roster entry, otherwise see
    /// [`Session::discovery`] and [`Fetch::fetch`].
    #[instrument(skip(self))]
    pub async fn rosters(&self) -> Result<FetchResponse> {
        let resolution = self.resolve(Capability::Roster).await?;
        let url = format!("{}/{}", resolution.endpoint, self.credentials.username());

        self.fetcher.fetch(&url, FetchOptions::get().bearer(resolution.access_token)).await
    }

    /// Fetch one roster entry by id
    ///
    /// # Errors
    /// `InvalidInput` for an empty `id` (nothing is sent), otherwise as
    /// [`Session::rosters`].
    #[instrument(skip(self))]
    pub async fn roster(&self, id: &str) -> Result<FetchResponse> {
        require("id", id).map_err(InfraError::from)?;

        let resolution = self.resolve(Capability::Roster).await?;
        let url = format!("{}/{}/{id}", resolution.endpoint, self.credentials.username());

        self.fetcher.fetch(&url, FetchOptions::get().bearer(resolution.access_token)).await
    }

    /// Upload a log file
    ///
    /// The discovered endpoint is a template; its `{filename_suffix}`
    /// placeholder is replaced by `filename`. The upload can be aborted with
    /// [`Session::log_upload_cancel`].
    ///
    /// # Errors
    /// `InvalidInput` before any request when `content` or `filename` is
    /// empty, `filename` has 32 or more characters or characters outside
    /// `[a-zA-Z0-9_.-]`, or `content` reaches 128 MiB. `Canceled` when the
    /// upload is canceled while outstanding.
    #[instrument(skip(self, content), fields(size = content.as_ref().len()))]
    pub async fn log_upload(
        &self,
        content: impl AsRef<[u8]> + Send,
        filename: &str,
    ) -> Result<FetchResponse> {
        let content = content.as_ref();
        validate_log_upload(content, filename).map_err(InfraError::from)?;

        let resolution = self.resolve(Capability::LogUpload).await?;
        let url = resolution.endpoint.replace(LOG_FILENAME_PLACEHOLDER, filename);
        let options = FetchOptions::post().bearer(resolution.access_token).body(content);

        self.fetcher.fetch(&url, options).await
    }

    /// Cancel the outstanding upload on the next scheduler tick
    ///
    /// The signal is untargeted: any request outstanding on this session's
    /// fetcher when it is delivered fails with `Canceled`.
    pub fn log_upload_cancel(&self) {
        debug!("scheduling upload cancel");
        self.fetcher.cancel_deferred();
    }

    async fn resolve(&self, capability: Capability) -> Result<ScopeResolution> {
        let scope = self.scopes.key(capability);
        self.discovery(scope)
            .await?
            .ok_or_else(|| RosterLinkError::ScopeUnavailable(scope.to_string()))
    }
}

fn expect_json(response: FetchResponse, what: &str) -> Result<Value> {
    response
        .into_json()
        .ok_or_else(|| RosterLinkError::Protocol(format!("{what} response is not JSON")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    /// Records requests and replays canned responses in order.
    #[derive(Default)]
    struct ScriptedFetch {
        responses: Mutex<Vec<Result<FetchResponse>>>,
        requests: Mutex<Vec<(String, FetchOptions)>>,
        cancels: AtomicUsize,
    }

    impl ScriptedFetch {
        fn replying(responses: Vec<Result<FetchResponse>>) -> Arc<Self> {
            let mut responses = responses;
            responses.reverse();
            Arc::new(Self { responses: Mutex::new(responses), ..Self::default() })
        }

        fn urls(&self) -> Vec<String> {
            self.requests.lock().iter().map(|(url, _)| url.clone()).collect()
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetch {
        async fn fetch(&self, url: &str, options: FetchOptions) -> Result<FetchResponse> {
            self.requests.lock().push((url.to_string(), options));
            self.responses.lock().pop().expect("unexpected request")
        }

        fn cancel_deferred(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn credentials() -> Credentials {
        Credentials::new(
            "client",
            "secret",
            "alice",
            "hunter2",
            vec!["a".into(), "b".into(), "c".into()],
            "password",
        )
    }

    fn scopes() -> ScopeCatalog {
        ScopeCatalog::new("acct", "user", "info", "roster", "logs")
    }

    fn session(fetch: &Arc<ScriptedFetch>) -> Session {
        Session::with_fetcher("https://id.example/", credentials(), scopes(), fetch.clone())
            .expect("session")
    }

    fn token() -> Result<FetchResponse> {
        Ok(FetchResponse::Json(json!({"access_token": "T", "token_type": "Bearer"})))
    }

    #[test]
    fn invalid_credentials_fail_before_any_request() {
        let fetch = ScriptedFetch::replying(Vec::new());
        let credentials = Credentials::new("", "secret", "alice", "hunter2", Vec::new(), "password");

        let err = Session::with_fetcher("https://id.example", credentials, scopes(), fetch.clone())
            .unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("client_id"));
        assert!(err.to_string().contains("scope"));
        assert!(fetch.urls().is_empty());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let fetch = ScriptedFetch::replying(Vec::new());
        assert_eq!(session(&fetch).endpoint(), "https://id.example");
    }

    #[tokio::test]
    async fn discovery_before_auth_is_rejected_without_io() {
        let fetch = ScriptedFetch::replying(Vec::new());
        let err = session(&fetch).discovery("roster").await.unwrap_err();

        assert_eq!(err, RosterLinkError::NotAuthenticated);
        assert!(fetch.urls().is_empty());
    }

    #[tokio::test]
    async fn auth_then_discovery_uses_bearer_token() {
        let fetch = ScriptedFetch::replying(vec![
            token(),
            Ok(FetchResponse::Json(json!({"user": {"endpoint": "https://u", "access_token": "U"}}))),
        ]);
        let session = session(&fetch);

        session.auth().await.expect("auth");
        let resolution = session.user_info().await.expect("discovery").expect("scope");

        assert_eq!(resolution.endpoint, "https://u");
        let requests = fetch.requests.lock();
        assert_eq!(requests[0].0, "https://id.example/auth/token");
        assert_eq!(requests[1].0, "https://id.example/auth/discovery");
        assert_eq!(requests[1].1.access_token.as_deref(), Some("T"));
        assert_eq!(requests[1].1.body.as_deref(), Some(&b"scope=user"[..]));
    }

    #[tokio::test]
    async fn failed_auth_keeps_previous_token() {
        let fetch = ScriptedFetch::replying(vec![
            token(),
            Err(RosterLinkError::Transport("connection reset".into())),
        ]);
        let session = session(&fetch);

        session.auth().await.expect("first auth");
        let err = session.auth().await.unwrap_err();

        assert_eq!(err, RosterLinkError::Transport("connection reset".into()));
        assert_eq!(session.auth_info().map(|info| info.access_token), Some("T".to_string()));
    }

    #[tokio::test]
    async fn text_token_response_is_protocol_error() {
        let fetch = ScriptedFetch::replying(vec![Ok(FetchResponse::Text("ok".into()))]);
        let session = session(&fetch);

        let err = session.auth().await.unwrap_err();

        assert!(matches!(err, RosterLinkError::Protocol(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn missing_roster_scope_is_scope_unavailable() {
        let fetch = ScriptedFetch::replying(vec![token(), Ok(FetchResponse::Json(json!({})))]);
        let session = session(&fetch);
        session.auth().await.expect("auth");

        let err = session.rosters().await.unwrap_err();
        assert_eq!(err, RosterLinkError::ScopeUnavailable("roster".into()));
    }

    #[tokio::test]
    async fn empty_roster_id_is_rejected_without_io() {
        let fetch = ScriptedFetch::replying(vec![token()]);
        let session = session(&fetch);
        session.auth().await.expect("auth");

        assert!(session.roster("").await.unwrap_err().is_validation());
        assert_eq!(fetch.urls().len(), 1);
    }

    #[tokio::test]
    async fn log_upload_substitutes_filename() {
        let fetch = ScriptedFetch::replying(vec![
            token(),
            Ok(FetchResponse::Json(json!({
                "logs": {"endpoint": "https://logs/upload/{filename_suffix}", "access_token": "L"}
            }))),
            Ok(FetchResponse::Text(String::new())),
        ]);
        let session = session(&fetch);
        session.auth().await.expect("auth");

        session.log_upload("line 1\nline 2", "app.log").await.expect("upload");

        let requests = fetch.requests.lock();
        assert_eq!(requests[2].0, "https://logs/upload/app.log");
        assert_eq!(requests[2].1.access_token.as_deref(), Some("L"));
        assert_eq!(requests[2].1.body.as_deref(), Some(&b"line 1\nline 2"[..]));
    }

    #[test]
    fn log_upload_cancel_is_deferred_to_the_fetcher() {
        let fetch = ScriptedFetch::replying(Vec::new());
        session(&fetch).log_upload_cancel();
        assert_eq!(fetch.cancels.load(Ordering::SeqCst), 1);
    }
}
