//! Repository URL parsing.
//!
//! Dependency manifests describe their source repository in many shapes
//! (`git+https://…/repo.git#branch`, `git@host:owner/repo`, plain web URLs).
//! Each supported hosting provider is a [`RepositoryHost`]; the
//! [`HostRegistry`] asks them in turn until one recognises the string.

use std::fmt;

use regex::Regex;

/// Owner/repository pair on a hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Key used by the license cache: `owner/repo`.
    pub fn cache_key(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A hosting provider able to recognise its own repository URLs.
pub trait RepositoryHost: Send + Sync {
    fn name(&self) -> &str;

    /// Extract owner and repository, or `None` if the URL is not hosted here.
    fn parse(&self, url: &str) -> Option<RepoRef>;
}

pub struct GitHubHost {
    pattern: Regex,
}

impl GitHubHost {
    pub fn new() -> Result<Self, regex::Error> {
        // `github.com/owner/repo` and the SSH form `github.com:owner/repo`
        let pattern = Regex::new(r"github\.com[/:]([^/]+)/([^/]+)")?;
        Ok(Self { pattern })
    }
}

impl RepositoryHost for GitHubHost {
    fn name(&self) -> &str {
        "github"
    }

    fn parse(&self, url: &str) -> Option<RepoRef> {
        let caps = self.pattern.captures(url)?;
        let owner = caps[1].to_string();
        let repo = strip_vcs_suffix(&caps[2]);

        if owner.is_empty() || repo.is_empty() {
            return None;
        }

        Some(RepoRef {
            owner,
            repo: repo.to_string(),
        })
    }
}

/// Drop `#branch` / `?query` qualifiers and a trailing `.git`.
fn strip_vcs_suffix(segment: &str) -> &str {
    let segment = segment
        .split(['#', '?'])
        .next()
        .unwrap_or(segment);
    segment.strip_suffix(".git").unwrap_or(segment)
}

/// Ordered set of hosting providers consulted when parsing a repository URL.
pub struct HostRegistry {
    hosts: Vec<Box<dyn RepositoryHost>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self { hosts: Vec::new() }
    }

    pub fn with_host(mut self, host: impl RepositoryHost + 'static) -> Self {
        self.hosts.push(Box::new(host));
        self
    }

    /// `None` for absent input or a URL no registered host recognises.
    pub fn parse(&self, url: Option<&str>) -> Option<RepoRef> {
        let url = url?.trim();
        if url.is_empty() {
            return None;
        }
        let parsed = self.hosts.iter().find_map(|host| {
            host.parse(url).inspect(|r| {
                tracing::trace!(host = host.name(), repo = %r, "Matched repository URL");
            })
        });
        if parsed.is_none() {
            tracing::debug!(url, "Repository URL not on a supported host");
        }
        parsed
    }

    /// Registry with GitHub as the only provider.
    pub fn github() -> Result<Self, regex::Error> {
        Ok(Self::new().with_host(GitHubHost::new()?))
    }
}
