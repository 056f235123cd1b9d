use super::requests::{CreateTokenRequest, SessionRequest};
use super::responses::{CreateTokenResponse, SessionResponse};
use super::{MintOptions, TokenMinter};
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Response, Url};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// HTTP settings for the ArgoCD client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub timeout: Duration,
}

/// Turn a configured server address into a base URL string
///
/// Addresses without an `http://` or `https://` scheme get `https://`.
/// Trailing slashes are dropped.
#[must_use]
pub fn normalize_server_addr(server_addr: &str) -> String {
    let addr = server_addr.trim();
    let with_scheme = if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("https://{addr}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// Unauthenticated ArgoCD API client
#[derive(Clone)]
pub struct ArgoCdClient {
    http: reqwest::Client,
    base_url: Url,
}

impl fmt::Debug for ArgoCdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgoCdClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ArgoCdClient {
    /// Build a client for `server_addr`
    ///
    /// Fails with `MissingServerAddress` on a blank address. No request is
    /// sent until [`ArgoCdClient::login`].
    pub fn new(server_addr: &str, options: &ClientOptions) -> Result<Self> {
        if server_addr.trim().is_empty() {
            return Err(Error::MissingServerAddress);
        }

        let normalized = normalize_server_addr(server_addr);
        let base_url = Url::parse(&normalized).map_err(|e| Error::InvalidServerAddress {
            address: server_addr.to_string(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() || base_url.host_str().is_none() {
            return Err(Error::InvalidServerAddress {
                address: server_addr.to_string(),
                message: "not a base URL".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .user_agent(options.user_agent.as_str())
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidServerAddress {
                address: self.base_url.to_string(),
                message: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Open a session with username and password
    ///
    /// Transport failures, non-2xx answers and answers without a token are
    /// all `AuthenticationFailed`.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let url = self.endpoint(&["api", "v1", "session"])?;
        let auth_failed = |message: &str, source: Option<reqwest::Error>| Error::AuthenticationFailed {
            server: self.base_url.to_string(),
            message: message.to_string(),
            source,
        };

        debug!(server = %self.base_url, username = %credentials.username, "Creating Argo CD session");
        let response = self
            .http
            .post(url)
            .json(&SessionRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| auth_failed("request failed", Some(e)))?;

        let response = error_for_status(response)
            .await
            .map_err(|message| auth_failed(&message, None))?;
        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| auth_failed("invalid session response", Some(e)))?;

        if body.token.is_empty() {
            return Err(auth_failed("session response carried no token", None));
        }

        info!(server = %self.base_url, "Argo CD session established");
        Ok(Session {
            client: self.clone(),
            auth_token: Zeroizing::new(body.token),
        })
    }
}

/// Authenticated session, bound to one server
pub struct Session {
    client: ArgoCdClient,
    auth_token: Zeroizing<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("server", &self.client.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenMinter for Session {
    async fn mint_token(&self, account: &str, options: &MintOptions) -> Result<String> {
        let mint_failed = |message: &str, source: Option<reqwest::Error>| Error::TokenMintFailed {
            account: account.to_string(),
            message: message.to_string(),
            source,
        };

        let url = self.client.endpoint(&["api", "v1", "account", account, "token"])?;
        debug!(account = %account, token_id = %options.id, "Minting Argo CD token");

        let response = self
            .client
            .http
            .post(url)
            .bearer_auth(self.auth_token.as_str())
            .json(&CreateTokenRequest {
                name: account,
                id: &options.id,
                expires_in: options.expires_in,
            })
            .send()
            .await
            .map_err(|e| mint_failed("request failed", Some(e)))?;

        let response = error_for_status(response)
            .await
            .map_err(|message| mint_failed(&message, None))?;
        let body: CreateTokenResponse = response
            .json()
            .await
            .map_err(|e| mint_failed("invalid token response", Some(e)))?;

        if body.token.is_empty() {
            return Err(mint_failed("token response carried no token", None));
        }
        Ok(body.token)
    }
}

/// Pass 2xx responses through, describe anything else
async fn error_for_status(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        Err(format!("unexpected status {status}"))
    } else {
        Err(format!("unexpected status {status}: {body}"))
    }
}
