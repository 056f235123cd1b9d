//! # Response Types
//!
//! JSON bodies returned by the ArgoCD API. Both the session and the
//! token endpoints answer with a single `token` field.

use serde::Deserialize;

/// Response of `POST /api/v1/session`
#[derive(Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub token: String,
}

/// Response of `POST /api/v1/account/{account}/token`
#[derive(Deserialize)]
pub struct CreateTokenResponse {
    #[serde(default)]
    pub token: String,
}

impl std::fmt::Debug for SessionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResponse").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for CreateTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateTokenResponse").finish_non_exhaustive()
    }
}
