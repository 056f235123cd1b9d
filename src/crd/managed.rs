//! # Managed resources
//!
//! The reconcile core handles managed resources through a tagged variant.
//! Only `Token` is actionable; anything else decodes to `Other` and fails
//! fast when an adapter is asked to act on it.

use super::token::Token;
use crate::error::{Error, Result};
use kube::api::GroupVersionKind;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Managed {
    Token(Arc<Token>),
    /// A kind this provider does not manage
    Other(GroupVersionKind),
}

impl Managed {
    /// Borrow the Token, or fail with `WrongResourceKind`
    pub fn as_token(&self) -> Result<&Token> {
        match self {
            Self::Token(token) => Ok(token),
            Self::Other(gvk) => Err(Error::WrongResourceKind {
                kind: gvk.kind.clone(),
            }),
        }
    }
}

impl From<Arc<Token>> for Managed {
    fn from(token: Arc<Token>) -> Self {
        Self::Token(token)
    }
}

impl From<Token> for Managed {
    fn from(token: Token) -> Self {
        Self::Token(Arc::new(token))
    }
}
