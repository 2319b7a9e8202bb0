use std::sync::{Arc, Once};

use rosterlink_domain::{Credentials, ScopeCatalog};
use rosterlink_infra::{Fetcher, Session};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCESS_TOKEN: &str = "bearer-token";

/// Install a test subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn credentials() -> Credentials {
    Credentials::new(
        "client",
        "s3cr3t",
        "alice",
        "hunter2",
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        "password",
    )
}

pub fn scopes() -> ScopeCatalog {
    ScopeCatalog::new(
        "account-scope",
        "userinfo-scope",
        "information-scope",
        "roster-scope",
        "log-scope",
    )
}

/// Mock identity server plus a session pointed at it.
pub struct IdentityServer {
    pub server: MockServer,
    pub fetcher: Arc<Fetcher>,
    pub session: Arc<Session>,
}

impl IdentityServer {
    pub async fn start() -> Self {
        init_tracing();

        let server = MockServer::start().await;
        let fetcher = Arc::new(Fetcher::new().expect("fetcher should build"));
        let session = Session::with_fetcher(server.uri(), credentials(), scopes(), fetcher.clone())
            .expect("session should build");

        Self { server, fetcher, session: Arc::new(session) }
    }

    /// Token endpoint answering `body` with `status`.
    pub async fn mount_token(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Discovery endpoint answering every scope with `body`.
    pub async fn mount_discovery(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path("/auth/discovery"))
            .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a successful token endpoint and authenticate the session.
    pub async fn authenticated() -> Self {
        let identity = Self::start().await;
        identity
            .mount_token(200, json!({"access_token": ACCESS_TOKEN, "token_type": "Bearer"}))
            .await;
        identity.session.auth().await.expect("auth should succeed");
        identity
    }

    /// Discovery entry for `scope` pointing back at this mock server.
    pub fn entry(&self, service_path: &str, scoped_token: &str) -> Value {
        json!({
            "endpoint": format!("{}{service_path}", self.server.uri()),
            "access_token": scoped_token,
        })
    }
}
