//! Minimal REST client shared by the [`crate::auth`] and [`crate::catalog`]
//! modules for the broker's HTTP surface (session exchange, instrument
//! catalog fetch). The streaming market feed has its own transport in
//! [`crate::ws::connection`] — this client only ever speaks plain JSON
//! request/response.

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ApiErrorBody, RelayError, Result};

/// A thin `reqwest::Client` wrapper that injects auth headers (when a
/// session is attached) and maps non-2xx responses to [`RelayError`].
#[derive(Debug, Clone)]
pub struct BrokerClient {
    http: reqwest::Client,
    base_url: String,
    auth_header_token: Option<HeaderValue>,
    auth_header_client_id: Option<HeaderValue>,
}

impl BrokerClient {
    /// Create a client carrying an authenticated session's headers.
    pub fn new(session: &crate::auth::AuthSession, base_url: impl Into<String>) -> Self {
        let auth_header_token = HeaderValue::from_str(&session.access_token).ok();
        let auth_header_client_id = HeaderValue::from_str(&session.client_id).ok();
        Self {
            http: Self::build_http(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            auth_header_token,
            auth_header_client_id,
        }
    }

    /// Create a client with no session attached — used for the
    /// session-exchange leg of the API auth flow, which has no token yet.
    pub fn new_unauthenticated(base_url: impl Into<String>) -> Self {
        Self {
            http: Self::build_http(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            auth_header_token: None,
            auth_header_client_id: None,
        }
    }

    fn build_http() -> reqwest::Client {
        reqwest::Client::builder()
            .default_headers(Self::default_headers())
            .build()
            .expect("failed to build reqwest client")
    }

    /// Perform a GET request and deserialize the JSON response.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let resp = self.http.get(&url).headers(self.auth_headers()).send().await?;
        self.handle_response(resp).await
    }

    /// Perform a POST request with a JSON body and deserialize the response.
    pub async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .headers(self.auth_headers())
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        if let Some(token) = &self.auth_header_token {
            headers.insert("access-token", token.clone());
        }
        if let Some(client_id) = &self.auth_header_client_id {
            headers.insert("client-id", client_id.clone());
        }
        headers
    }

    /// Read a response, returning either the deserialized body or a
    /// [`RelayError`]. Uses `bytes()` + `serde_json::from_slice()` to avoid
    /// the UTF-8 validation overhead `text()` + `from_str()` would incur.
    async fn handle_response<R: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<R> {
        let status = resp.status();
        let bytes = resp.bytes().await.unwrap_or_default();

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(RelayError::Json)
        } else {
            let body = String::from_utf8_lossy(&bytes);
            Err(self.parse_error_body(status, &body))
        }
    }

    fn parse_error_body(&self, status: reqwest::StatusCode, body: &str) -> RelayError {
        if let Ok(api_err) = serde_json::from_str::<ApiErrorBody>(body) {
            if api_err.error_code.is_some() || api_err.error_message.is_some() {
                return RelayError::Api(api_err);
            }
        }
        RelayError::HttpStatus {
            status,
            body: body.to_owned(),
        }
    }
}
