//! Session resolution against the external auth provider.
//!
//! The provider owns sign-in, cookies and session storage. This service only
//! forwards the caller's credentials and reads back who they are.

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod client;
pub mod guard;
pub mod handlers;

pub use client::AuthClient;

#[derive(Debug, Error)]
pub enum AuthClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Auth provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// An authenticated session as reported by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub session: SessionInfo,
    pub user: SessionUser,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Resolves the caller's session from request headers.
///
/// Carried in `AppState` as `Arc<dyn SessionResolver>`.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// `Ok(None)` means the caller is not signed in.
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthClientError>;

    /// Ends the caller's session. Returns `set-cookie` values to relay back.
    async fn sign_out(&self, headers: &HeaderMap) -> Result<Vec<String>, AuthClientError>;
}
