use reqwest::Method;
use url::form_urlencoded;

/// Per-request options for [`super::Fetch::fetch`]
#[derive(Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub method: Method,
    /// Sent as `Authorization: Bearer {token}` when present
    pub access_token: Option<String>,
    /// Sent with a form content type when present; empty body otherwise
    pub body: Option<Vec<u8>>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { method: Method::GET, access_token: None, body: None }
    }
}

impl FetchOptions {
    /// `GET` with no token and no body
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self { method: Method::POST, ..Self::default() }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn bearer(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// URL-encode `pairs` as the request body, keeping their order
    #[must_use]
    pub fn form<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();
        self.body(encoded.into_bytes())
    }

    /// Raw request body
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl std::fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOptions")
            .field("method", &self.method)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}
