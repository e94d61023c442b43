//! Batch license URL resolution.
//!
//! Every record is resolved concurrently on the calling task through
//! repository parsing, the [`LicenseCache`], and, on a cache miss, the
//! [`LicenseFetcher`]. A record whose resolution fails (or panics) comes back
//! with no license URL; its siblings are unaffected.

use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;
use indicatif::ProgressBar;

use crate::api::ContentsApi;
use crate::cache::{CacheLookup, LicenseCache};
use crate::fetcher::LicenseFetcher;
use crate::models::{DependencyRecord, ResolvedRecord};
use crate::repository::HostRegistry;

pub struct Resolver<'a, A> {
    hosts: &'a HostRegistry,
    cache: &'a LicenseCache,
    fetcher: &'a LicenseFetcher<A>,
    progress: Option<ProgressBar>,
}

impl<'a, A: ContentsApi> Resolver<'a, A> {
    pub fn new(
        hosts: &'a HostRegistry,
        cache: &'a LicenseCache,
        fetcher: &'a LicenseFetcher<A>,
    ) -> Self {
        Self {
            hosts,
            cache,
            fetcher,
            progress: None,
        }
    }

    /// Tick `progress` once per settled record.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Resolve all records; the output preserves input order.
    pub async fn resolve_all(&self, records: Vec<DependencyRecord>) -> Vec<ResolvedRecord> {
        let pending = records.iter().map(|record| async move {
            let settled = AssertUnwindSafe(self.resolve_one(record))
                .catch_unwind()
                .await;
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
            settled
        });

        let settled = join_all(pending).await;

        records
            .into_iter()
            .zip(settled)
            .map(|(record, outcome)| {
                let license_url = outcome.unwrap_or_else(|_| {
                    tracing::error!(module = %record.module_id, "License resolution aborted");
                    None
                });
                ResolvedRecord {
                    record,
                    license_url,
                }
            })
            .collect()
    }

    async fn resolve_one(&self, record: &DependencyRecord) -> Option<String> {
        let repo = self.hosts.parse(record.repository_url.as_deref())?;

        match self.cache.get(&repo.cache_key()).await {
            CacheLookup::Hit(url) => {
                tracing::trace!(module = %record.module_id, repo = %repo, "Cache hit");
                url
            }
            CacheLookup::Miss => self.fetcher.fetch(&repo, self.cache).await,
        }
    }
}
