use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::scanner::split_list;

#[derive(Parser, Debug)]
#[command(
    name = "foss-licenses",
    about = "Generate FOSS license reports with links to each dependency's license file",
    version
)]
pub struct Cli {
    /// GitHub personal access token
    #[arg(env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_auth_token: String,

    /// Directory to start license checking
    #[arg(long, default_value = ".")]
    pub start: PathBuf,

    /// Include development dependencies (production only by default)
    #[arg(long)]
    pub include_dev: bool,

    /// Render multi-license packages as an OR expression
    #[arg(long)]
    pub boolean: bool,

    /// Leave out packages that declare no license
    #[arg(long)]
    pub no_unknown: bool,

    /// Comma-separated list of packages to exclude (repeatable)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub exclude_packages: Vec<String>,

    /// `;`- or `,`-separated package name prefixes to exclude [default: jest;@jest;@types]
    #[arg(long, value_name = "PREFIXES")]
    pub exclude_packages_starting_with: Option<String>,

    /// Config file [default: <start>/.foss-licenses/config.toml, fallback ~/.config/foss-licenses/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for reports and the license cache [default: ./foss-license]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Hosting API base URL
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Rate-limit retries per repository before giving up (0 = unlimited)
    #[arg(long, value_name = "N")]
    pub max_rate_limit_retries: Option<u32>,

    /// Total rate-limit wait per repository in seconds (0 = unlimited)
    #[arg(long, value_name = "SECS")]
    pub max_rate_limit_wait: Option<u64>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Debug logging and a table of every reported component
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and a one-line summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// `EnvFilter` directive for the selected verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "warn,foss_licenses=debug"
        } else if self.quiet {
            "warn"
        } else {
            "warn,foss_licenses=info"
        }
    }

    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut Config) {
        let scan = &mut config.scan;
        if self.include_dev {
            scan.production = false;
        }
        if self.boolean {
            scan.boolean = true;
        }
        if self.no_unknown {
            scan.unknown = false;
        }
        if !self.exclude_packages.is_empty() {
            scan.exclude_packages = self
                .exclude_packages
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(prefixes) = &self.exclude_packages_starting_with {
            scan.exclude_prefixes = split_list(prefixes);
        }

        let fetch = &mut config.fetch;
        if let Some(base) = &self.api_base {
            fetch.api_base = base.clone();
        }
        if let Some(n) = self.max_rate_limit_retries {
            fetch.max_rate_limit_retries = n;
        }
        if let Some(secs) = self.max_rate_limit_wait {
            fetch.max_rate_limit_wait_secs = secs;
        }

        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
    }
}
