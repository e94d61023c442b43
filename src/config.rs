use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::api::github::DEFAULT_API_BASE;
use crate::fetcher::RetryPolicy;
use crate::scanner::ScanOptions;

/// Root configuration structure, deserialized from `.foss-licenses/config.toml`.
///
/// Every section and field is optional; command-line flags take precedence.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// Which dependencies end up in the report.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    pub production: bool,
    pub boolean: bool,
    pub unknown: bool,
    pub exclude_packages: Vec<String>,
    pub exclude_prefixes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let defaults = ScanOptions::default();
        Self {
            production: defaults.production,
            boolean: defaults.boolean,
            unknown: defaults.unknown,
            exclude_packages: defaults.exclude_packages,
            exclude_prefixes: defaults.exclude_prefixes,
        }
    }
}

impl ScanConfig {
    pub fn to_options(&self, start: PathBuf) -> ScanOptions {
        ScanOptions {
            start,
            production: self.production,
            boolean: self.boolean,
            unknown: self.unknown,
            exclude_packages: self.exclude_packages.clone(),
            exclude_prefixes: self.exclude_prefixes.clone(),
        }
    }
}

/// Hosting API access and rate-limit handling.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub api_base: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Rate-limit retries per repository; `0` removes the cap.
    pub max_rate_limit_retries: u32,
    /// Cumulative rate-limit wait per repository; `0` removes the cap.
    pub max_rate_limit_wait_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 10,
            max_rate_limit_retries: policy.max_retries.unwrap_or(0),
            max_rate_limit_wait_secs: policy.max_total_wait.map_or(0, |d| d.as_secs()),
        }
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: (self.max_rate_limit_retries > 0).then_some(self.max_rate_limit_retries),
            max_total_wait: (self.max_rate_limit_wait_secs > 0)
                .then(|| Duration::from_secs(self.max_rate_limit_wait_secs)),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where reports and the license cache are written.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Relative paths are resolved against the invocation directory.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("foss-license"),
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.foss-licenses/config.toml`
/// 3. `~/.config/foss-licenses/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".foss-licenses").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("foss-licenses")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    tracing::debug!("No config file found, using defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert!(cfg.scan.production);
        assert!(!cfg.scan.boolean);
        assert!(cfg.scan.unknown);
        assert_eq!(cfg.scan.exclude_prefixes, vec!["jest", "@jest", "@types"]);
        assert_eq!(cfg.fetch.api_base, "https://api.github.com");
        assert_eq!(cfg.fetch.retry_policy(), RetryPolicy::default());
        assert_eq!(cfg.output.dir, PathBuf::from("foss-license"));

        let options = cfg.scan.to_options(PathBuf::from("/project"));
        assert_eq!(options.start, PathBuf::from("/project"));
        assert_eq!(options, ScanOptions {
            start: PathBuf::from("/project"),
            ..ScanOptions::default()
        });
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[scan]
production = false
exclude_packages = ["left-pad"]

[fetch]
max_rate_limit_retries = 0
"#,
        )
        .unwrap();

        assert!(!cfg.scan.production);
        assert!(cfg.scan.unknown);
        assert_eq!(cfg.scan.exclude_packages, vec!["left-pad"]);
        assert_eq!(cfg.scan.exclude_prefixes, vec!["jest", "@jest", "@types"]);
        assert_eq!(cfg.fetch.timeout_secs, 10);

        let policy = cfg.fetch.retry_policy();
        assert_eq!(policy.max_retries, None);
        assert_eq!(policy.max_total_wait, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_project_config_is_found() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join(".foss-licenses");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(cfg_dir.join("config.toml"), "[output]\ndir = \"reports\"\n").unwrap();

        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.output.dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_override_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scan\nproduction = ").unwrap();
        assert!(load_config(dir.path(), Some(&path)).is_err());
    }
}
