use serde::{Deserialize, Serialize};

/// One third-party package as reported by a dependency scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// `name@version`, unique within a scan.
    pub module_id: String,
    /// Declared license expression, or `UNKNOWN`.
    pub declared_licenses: String,
    pub repository_url: Option<String>,
    pub publisher: Option<String>,
}

impl DependencyRecord {
    /// Package name without the trailing `@version` (scoped names keep their leading `@`).
    pub fn name(&self) -> &str {
        match self.module_id.rfind('@') {
            Some(idx) if idx > 0 => &self.module_id[..idx],
            _ => &self.module_id,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self.module_id.rfind('@') {
            Some(idx) if idx > 0 => Some(&self.module_id[idx + 1..]),
            _ => None,
        }
    }
}

/// A dependency record enriched with the location of its license file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    #[serde(flatten)]
    pub record: DependencyRecord,
    pub license_url: Option<String>,
}

impl ResolvedRecord {
    /// Only records with a known repository make it into the reports.
    pub fn is_reportable(&self) -> bool {
        self.record.repository_url.is_some()
    }
}

/// An entry of a repository root listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentEntry {
    pub path: String,
    pub html_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(module_id: &str) -> DependencyRecord {
        DependencyRecord {
            module_id: module_id.to_string(),
            declared_licenses: "MIT".to_string(),
            repository_url: None,
            publisher: None,
        }
    }

    #[test]
    fn test_name_and_version() {
        let dep = record("lodash@4.17.21");
        assert_eq!(dep.name(), "lodash");
        assert_eq!(dep.version(), Some("4.17.21"));
    }

    #[test]
    fn test_scoped_name_and_version() {
        let dep = record("@types/node@20.1.0");
        assert_eq!(dep.name(), "@types/node");
        assert_eq!(dep.version(), Some("20.1.0"));

        let bare = record("@scope/pkg");
        assert_eq!(bare.name(), "@scope/pkg");
        assert_eq!(bare.version(), None);
    }
}
