use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};

use super::{ApiError, ContentsApi, CredentialError};
use crate::models::ContentEntry;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const UA: &str = concat!("foss-licenses/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for the GitHub REST API.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Cheap authenticated request against the API root to validate the token.
    pub async fn verify_token(&self) -> Result<(), CredentialError> {
        let response = self
            .get(&format!("{}/", self.base_url))
            .await
            .map_err(|e| CredentialError::Other(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(failure(response).await.into())
    }

    async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(url)
            .header(USER_AGENT, UA)
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
    }
}

#[async_trait]
impl ContentsApi for GitHubClient {
    async fn list_root(&self, owner: &str, repo: &str) -> Result<Vec<ContentEntry>, ApiError> {
        let url = format!("{}/repos/{}/{}/contents", self.base_url, owner, repo);
        let response = self.get(&url).await?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        Ok(response.json().await?)
    }
}

async fn failure(response: Response) -> ApiError {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    classify_failure(status, &headers, &body)
}

/// Turn a non-success response into an [`ApiError`].
///
/// A 403 (or 429) with `x-ratelimit-remaining: 0` is a primary rate-limit
/// rejection; `x-ratelimit-reset` carries the refill time in UNIX seconds.
pub fn classify_failure(status: StatusCode, headers: &HeaderMap, body: &str) -> ApiError {
    let limited = matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    ) && header_str(headers, "x-ratelimit-remaining") == Some("0");

    if limited {
        let reset = header_str(headers, "x-ratelimit-reset")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        return ApiError::RateLimited { reset };
    }

    // GitHub error bodies look like {"message": "...", "documentation_url": "..."}
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
