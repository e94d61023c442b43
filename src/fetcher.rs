//! License file lookup with rate-limit backoff.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use regex::Regex;

use crate::api::{ApiError, ContentsApi};
use crate::cache::LicenseCache;
use crate::models::ContentEntry;
use crate::repository::RepoRef;

/// Caps on waiting out rate-limit rejections for a single repository.
///
/// `None` in either field removes that cap.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: Option<u32>,
    pub max_total_wait: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Some(10),
            max_total_wait: Some(Duration::from_secs(3600)),
        }
    }
}

impl RetryPolicy {
    fn allows(&self, retries: u32, waited: Duration, next_delay: Duration) -> bool {
        let retries_ok = self.max_retries.is_none_or(|max| retries < max);
        let wait_ok = self
            .max_total_wait
            .is_none_or(|max| waited.saturating_add(next_delay) <= max);
        retries_ok && wait_ok
    }
}

/// Outcome of a lookup before it is cached.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(String),
    NotFound,
    /// Rate limited beyond the retry policy; not cached so a later run retries.
    GaveUp,
}

pub struct LicenseFetcher<A> {
    api: A,
    policy: RetryPolicy,
    license_file: Regex,
}

impl<A: ContentsApi> LicenseFetcher<A> {
    pub fn new(api: A, policy: RetryPolicy) -> Result<Self, regex::Error> {
        Ok(Self {
            api,
            policy,
            license_file: Regex::new(r"(?i)(licen[cs]e|copying)")?,
        })
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    /// Look up the license file of `repo` and record the outcome in `cache`.
    ///
    /// Does not consult the cache; callers check it first.
    pub async fn fetch(&self, repo: &RepoRef, cache: &LicenseCache) -> Option<String> {
        match self.lookup(repo).await {
            FetchOutcome::Found(url) => {
                cache.insert(&repo.cache_key(), Some(url.clone())).await;
                Some(url)
            }
            FetchOutcome::NotFound => {
                cache.insert(&repo.cache_key(), None).await;
                None
            }
            FetchOutcome::GaveUp => None,
        }
    }

    /// Query the API, waiting out rate-limit rejections within the retry policy.
    pub async fn lookup(&self, repo: &RepoRef) -> FetchOutcome {
        let mut retries = 0u32;
        let mut waited = Duration::ZERO;

        loop {
            match self.api.list_root(&repo.owner, &repo.repo).await {
                Ok(entries) => {
                    return match self.find_license(&entries) {
                        Some(url) => {
                            tracing::debug!(repo = %repo, url, "License file found");
                            FetchOutcome::Found(url)
                        }
                        None => {
                            tracing::debug!(repo = %repo, "No license file in repository root");
                            FetchOutcome::NotFound
                        }
                    };
                }
                Err(ApiError::RateLimited { reset }) => {
                    let delay = delay_until(reset, SystemTime::now());

                    if !self.policy.allows(retries, waited, delay) {
                        tracing::warn!(
                            repo = %repo,
                            retries,
                            waited_ms = waited.as_millis() as u64,
                            "Rate limit retry budget exhausted, giving up"
                        );
                        return FetchOutcome::GaveUp;
                    }

                    tracing::info!(
                        repo = %repo,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limit exceeded. Waiting before retrying"
                    );
                    tokio::time::sleep(delay).await;

                    retries += 1;
                    waited += delay;
                }
                Err(e) => {
                    tracing::error!(repo = %repo, error = %e, "Error fetching license file");
                    return FetchOutcome::NotFound;
                }
            }
        }
    }

    fn find_license(&self, entries: &[ContentEntry]) -> Option<String> {
        entries
            .iter()
            .find(|entry| self.license_file.is_match(&entry.path))
            .and_then(|entry| entry.html_url.clone())
    }
}

/// Milliseconds from `now` until the UNIX-seconds `reset`, never negative.
fn delay_until(reset: u64, now: SystemTime) -> Duration {
    let now_ms = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let reset_ms = u128::from(reset) * 1000;
    let delay_ms = reset_ms.saturating_sub(now_ms);
    Duration::from_millis(u64::try_from(delay_ms).unwrap_or(u64::MAX))
}
