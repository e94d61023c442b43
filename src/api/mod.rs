//! Hosting provider API access.
//!
//! [`ContentsApi`] is the seam between the fetcher and the network; the
//! [`github`] module provides the REST implementation used in production.
//! Rate-limit rejections are surfaced as [`ApiError::RateLimited`] so the
//! caller can decide whether and how long to wait.

pub mod github;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ContentEntry;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Quota exhausted; `reset` is the UNIX time (seconds) at which it refills.
    #[error("rate limit exceeded, resets at {reset}")]
    RateLimited { reset: u64 },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid authentication token. Please check your token and try again.")]
    Invalid,

    #[error("Authentication token is not authorized for this request. Ensure the token has the correct permissions.")]
    Unauthorized,

    #[error("API endpoint not found. This may indicate an issue with the API base URL or token.")]
    EndpointNotFound,

    #[error("An error occurred while verifying the authentication token: {0}")]
    Other(String),
}

impl From<ApiError> for CredentialError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status: 401, .. } => CredentialError::Invalid,
            ApiError::Status { status: 403, .. } | ApiError::RateLimited { .. } => {
                CredentialError::Unauthorized
            }
            ApiError::Status { status: 404, .. } => CredentialError::EndpointNotFound,
            other => CredentialError::Other(other.to_string()),
        }
    }
}

/// Repository content listing, as needed to locate a license file.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// List the entries at the root of `owner/repo`.
    async fn list_root(&self, owner: &str, repo: &str) -> Result<Vec<ContentEntry>, ApiError>;
}
