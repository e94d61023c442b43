//! Dependency tree enumeration.
//!
//! A [`DependencyScanner`] turns an installed project into
//! [`DependencyRecord`]s. Only npm projects are supported today
//! ([`node::NodeScanner`]).

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::models::DependencyRecord;

pub mod node;

/// License string used when a package declares none.
pub const UNKNOWN_LICENSE: &str = "UNKNOWN";

/// Filters applied while scanning.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// Directory holding the project manifest.
    pub start: PathBuf,
    /// Skip development-only dependencies.
    pub production: bool,
    /// Render legacy multi-license arrays as an `OR` expression.
    pub boolean: bool,
    /// Keep packages without a declared license (reported as `UNKNOWN`).
    pub unknown: bool,
    /// Package names to leave out.
    pub exclude_packages: Vec<String>,
    /// Package name prefixes to leave out (e.g. `@types`).
    pub exclude_prefixes: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            start: PathBuf::from("."),
            production: true,
            boolean: false,
            unknown: true,
            exclude_packages: Vec::new(),
            exclude_prefixes: vec!["jest".to_string(), "@jest".to_string(), "@types".to_string()],
        }
    }
}

impl ScanOptions {
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude_packages.iter().any(|p| p == name)
            || self
                .exclude_prefixes
                .iter()
                .any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
    }
}

/// Split a `;`- or `,`-separated list, dropping empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub trait DependencyScanner {
    fn scan(&self, options: &ScanOptions) -> Result<Vec<DependencyRecord>>;
}

/// Pick a scanner by looking for known manifest files under `path`.
pub fn detect_scanner(path: &Path) -> Option<Box<dyn DependencyScanner>> {
    if path.join("package-lock.json").exists()
        || path.join("package.json").exists()
        || path.join("node_modules").is_dir()
    {
        return Some(Box::new(node::NodeScanner::new()));
    }
    None
}
