//! Credential acquisition: turns the configured [`crate::config::AuthMethod`]
//! into an opaque [`AuthSession`] the rest of the crate treats as a black
//! box.
//!
//! Pluggable via the [`Authenticator`] trait so tests and alternate brokers
//! can supply their own session without touching the scheduler.

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::BrokerClient;
use crate::config::AuthMethod;
use crate::error::{RelayError, Result};

/// An opaque authenticated session: everything the rest of the crate needs
/// to open an Upstream Connection or call the broker's REST API.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Bearer/access token attached to every subsequent request.
    pub access_token: String,
    /// Broker-assigned client/user id.
    pub client_id: String,
}

/// Produces an [`AuthSession`] from configured credentials. Implementations
/// own whatever handshake the broker requires; callers never see the
/// intermediate steps.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Perform the credential flow and return an authenticated session.
    /// Failure here is always fatal at startup; this crate never retries
    /// an initial auth failure locally.
    async fn authenticate(&self) -> Result<AuthSession>;
}

/// Build the [`Authenticator`] matching a loaded [`AuthMethod`].
pub fn authenticator_for(method: &AuthMethod) -> Box<dyn Authenticator> {
    match method {
        AuthMethod::Api { api_key, api_secret } => Box::new(ApiAuthenticator {
            api_key: api_key.clone(),
            api_secret: api_secret.clone(),
        }),
        AuthMethod::EncToken { enctoken, userid } => Box::new(EncTokenAuthenticator {
            enctoken: enctoken.clone(),
            userid: userid.clone(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    #[serde(alias = "user_id")]
    client_id: String,
}

/// API-key login flow: exchanges `API_KEY`/`API_SECRET` for a session via
/// the broker's session endpoint. The request-token leg of the handshake
/// (a browser redirect the user completes by hand) happens upstream of this
/// crate — `REQUEST_TOKEN` is expected to already be in the environment by
/// the time `authenticate` runs.
pub struct ApiAuthenticator {
    api_key: String,
    api_secret: String,
}

#[async_trait]
impl Authenticator for ApiAuthenticator {
    async fn authenticate(&self) -> Result<AuthSession> {
        let request_token = std::env::var("REQUEST_TOKEN").map_err(|_| {
            RelayError::AuthError(
                "REQUEST_TOKEN not set; complete the broker login redirect first".into(),
            )
        })?;

        let client = BrokerClient::new_unauthenticated(crate::constants::AUTH_BASE_URL);
        let body = serde_json::json!({
            "api_key": self.api_key,
            "api_secret": self.api_secret,
            "request_token": request_token,
        });
        let resp: SessionResponse = client
            .post("/session/token", &body)
            .await
            .map_err(|e| RelayError::AuthError(e.to_string()))?;

        Ok(AuthSession {
            access_token: resp.access_token,
            client_id: resp.client_id,
        })
    }
}

/// Pre-issued enctoken flow: `ENCTOKEN`/`USERID` already constitute a valid
/// session, so no network round trip is needed.
pub struct EncTokenAuthenticator {
    enctoken: String,
    userid: String,
}

#[async_trait]
impl Authenticator for EncTokenAuthenticator {
    async fn authenticate(&self) -> Result<AuthSession> {
        if self.enctoken.is_empty() {
            return Err(RelayError::AuthError("ENCTOKEN is empty".into()));
        }
        Ok(AuthSession {
            access_token: self.enctoken.clone(),
            client_id: self.userid.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enctoken_flow_builds_session_without_network() {
        let auth = EncTokenAuthenticator {
            enctoken: "tok123".into(),
            userid: "AB1234".into(),
        };
        let session = auth.authenticate().await.unwrap();
        assert_eq!(session.access_token, "tok123");
        assert_eq!(session.client_id, "AB1234");
    }

    #[tokio::test]
    async fn enctoken_flow_rejects_empty_token() {
        let auth = EncTokenAuthenticator {
            enctoken: String::new(),
            userid: "AB1234".into(),
        };
        assert!(auth.authenticate().await.is_err());
    }
}
