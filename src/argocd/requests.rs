//! # Request Types
//!
//! JSON bodies sent to the ArgoCD API.

use serde::Serialize;

/// Body of `POST /api/v1/session`
#[derive(Serialize)]
pub struct SessionRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl std::fmt::Debug for SessionRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /api/v1/account/{account}/token`
///
/// `expiresIn` is in seconds, 0 meaning the token never expires.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest<'a> {
    pub name: &'a str,
    pub id: &'a str,
    pub expires_in: i64,
}
