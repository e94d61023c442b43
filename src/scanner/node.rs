use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use super::{DependencyScanner, ScanOptions, UNKNOWN_LICENSE};
use crate::models::DependencyRecord;

pub struct NodeScanner;

impl NodeScanner {
    pub fn new() -> Self {
        Self
    }
}

/// A package found in the lockfile or under `node_modules`.
struct Package {
    name: String,
    version: String,
    dev: bool,
    /// License as recorded in the lockfile, if any.
    lock_license: Option<String>,
    /// Installed `package.json`, if present.
    manifest: Option<Value>,
}

impl DependencyScanner for NodeScanner {
    fn scan(&self, options: &ScanOptions) -> Result<Vec<DependencyRecord>> {
        let lock = options.start.join("package-lock.json");

        let packages = if lock.exists() {
            read_package_lock(&lock, &options.start)?
        } else {
            tracing::debug!("No package-lock.json, walking node_modules");
            if options.production {
                tracing::warn!("Without a lockfile development dependencies cannot be told apart");
            }
            read_node_modules(&options.start.join("node_modules"))?
        };

        // Keyed by module id: drops duplicates and sorts the output
        let mut records: BTreeMap<String, DependencyRecord> = BTreeMap::new();

        for pkg in packages {
            if options.production && pkg.dev {
                continue;
            }
            if options.is_excluded(&pkg.name) {
                tracing::trace!(package = %pkg.name, "Excluded");
                continue;
            }

            let manifest = pkg.manifest.as_ref();
            let license = pkg
                .lock_license
                .or_else(|| manifest.and_then(|m| license_from_manifest(m, options.boolean)));

            let declared_licenses = match license {
                Some(license) => license,
                None if options.unknown => UNKNOWN_LICENSE.to_string(),
                None => {
                    tracing::debug!(package = %pkg.name, "Skipping package without a declared license");
                    continue;
                }
            };

            let module_id = format!("{}@{}", pkg.name, pkg.version);
            records.insert(
                module_id.clone(),
                DependencyRecord {
                    module_id,
                    declared_licenses,
                    repository_url: manifest.and_then(repository_from_manifest),
                    publisher: manifest.and_then(publisher_from_manifest),
                },
            );
        }

        Ok(records.into_values().collect())
    }
}

/// Parse `package-lock.json` v2/v3 (the `packages` map), reading each
/// package's installed `package.json` for repository and author metadata.
///
/// A v1 lockfile has no `packages` map; the installed `node_modules` tree is
/// read instead.
fn read_package_lock(lock_path: &Path, project_root: &Path) -> Result<Vec<Package>> {
    let content = std::fs::read_to_string(lock_path)
        .with_context(|| format!("Failed to read {}", lock_path.display()))?;
    let json: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", lock_path.display()))?;

    let mut packages = Vec::new();

    let Some(entries) = json.get("packages").and_then(|v| v.as_object()) else {
        tracing::warn!(
            "{} has no `packages` map (lockfile v1?); walking node_modules",
            lock_path.display()
        );
        return read_node_modules(&project_root.join("node_modules"));
    };

    for (pkg_path, info) in entries {
        // Root entry (empty key) and workspace links
        if pkg_path.is_empty() || info.get("link").and_then(Value::as_bool) == Some(true) {
            continue;
        }

        // "node_modules/a/node_modules/@scope/b" → "@scope/b"
        let derived = pkg_path
            .rsplit_once("node_modules/")
            .map(|(_, name)| name)
            .unwrap_or(pkg_path);
        let name = info
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(derived)
            .to_string();

        let version = info
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("*")
            .to_string();

        // `devOptional` alone is still installed with --omit=dev
        let dev = info.get("dev").and_then(Value::as_bool) == Some(true);

        packages.push(Package {
            name,
            version,
            dev,
            lock_license: info.get("license").and_then(Value::as_str).map(str::to_string),
            manifest: read_manifest(&project_root.join(pkg_path).join("package.json")),
        });
    }

    Ok(packages)
}

/// Walk `node_modules` one level deep (two for `@scope` directories).
fn read_node_modules(dir: &Path) -> Result<Vec<Package>> {
    let mut packages = Vec::new();
    if !dir.is_dir() {
        return Ok(packages);
    }

    let mut package_dirs = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') || !path.is_dir() {
            continue;
        }
        if file_name.starts_with('@') {
            for scoped in std::fs::read_dir(&path)? {
                let scoped = scoped?.path();
                if scoped.is_dir() {
                    package_dirs.push(scoped);
                }
            }
        } else {
            package_dirs.push(path);
        }
    }

    for pkg_dir in package_dirs {
        let Some(manifest) = read_manifest(&pkg_dir.join("package.json")) else {
            continue;
        };
        let Some(name) = manifest.get("name").and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        let version = manifest
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("*")
            .to_string();

        packages.push(Package {
            name,
            version,
            dev: false,
            lock_license: None,
            manifest: Some(manifest),
        });
    }

    Ok(packages)
}

fn read_manifest(path: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Declared license: `"license": "MIT"`, `"license": {"type": "MIT"}`, or the
/// legacy `"licenses": [...]` array.
fn license_from_manifest(manifest: &Value, boolean: bool) -> Option<String> {
    match manifest.get("license") {
        Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
        Some(Value::Object(obj)) => {
            if let Some(t) = obj.get("type").and_then(Value::as_str) {
                return Some(t.to_string());
            }
        }
        _ => {}
    }

    let legacy: Vec<&str> = manifest
        .get("licenses")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|l| match l {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("type").and_then(Value::as_str),
            _ => None,
        })
        .collect();

    match legacy.as_slice() {
        [] => None,
        [single] => Some(single.to_string()),
        many if boolean => Some(format!("({})", many.join(" OR "))),
        many => Some(many.join(", ")),
    }
}

/// Repository URL: `"repository": "..."` or `{"url": "..."}`, with npm
/// shorthands (`github:owner/repo`, `owner/repo`) expanded.
fn repository_from_manifest(manifest: &Value) -> Option<String> {
    let raw = match manifest.get("repository")? {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str)?,
        _ => return None,
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(expand_shorthand(raw))
}

fn expand_shorthand(raw: &str) -> String {
    for (prefix, host) in [
        ("github:", "github.com"),
        ("gitlab:", "gitlab.com"),
        ("bitbucket:", "bitbucket.org"),
    ] {
        if let Some(path) = raw.strip_prefix(prefix) {
            return format!("https://{host}/{path}");
        }
    }

    // Bare "owner/repo" means GitHub
    if !raw.contains(':') && raw.matches('/').count() == 1 && !raw.starts_with('/') {
        return format!("https://github.com/{raw}");
    }

    raw.to_string()
}

/// Publisher: `"author": "Name <mail> (url)"` or `{"name": "..."}`.
fn publisher_from_manifest(manifest: &Value) -> Option<String> {
    let name = match manifest.get("author")? {
        Value::String(s) => s
            .split(['<', '('])
            .next()
            .unwrap_or(s)
            .trim()
            .to_string(),
        Value::Object(obj) => obj.get("name").and_then(Value::as_str)?.trim().to_string(),
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join("package-lock.json"),
            r#"{
  "name": "my-app",
  "lockfileVersion": 3,
  "packages": {
    "": { "name": "my-app", "version": "1.0.0" },
    "node_modules/express": { "version": "4.18.2", "license": "MIT" },
    "node_modules/@acme/widget": { "version": "2.0.0" },
    "node_modules/jest": { "version": "29.0.0", "dev": true, "license": "MIT" },
    "node_modules/@types/node": { "version": "20.1.0", "license": "MIT" },
    "node_modules/mystery": { "version": "0.0.1" },
    "node_modules/fsevents": { "version": "2.3.3", "optional": true, "devOptional": true, "license": "MIT" },
    "node_modules/express/node_modules/debug": { "version": "2.6.9", "license": "MIT" },
    "packages/local": { "link": true, "resolved": "packages/local" }
  }
}"#,
        );
        write(
            &dir.path().join("node_modules/express/package.json"),
            r#"{
  "name": "express",
  "version": "4.18.2",
  "license": "MIT",
  "author": "TJ Holowaychuk <tj@vision-media.ca>",
  "repository": "expressjs/express"
}"#,
        );
        write(
            &dir.path().join("node_modules/@acme/widget/package.json"),
            r#"{
  "name": "@acme/widget",
  "version": "2.0.0",
  "licenses": [{ "type": "MIT" }, { "type": "Apache-2.0" }],
  "author": { "name": "Acme Inc.", "email": "oss@acme.test" },
  "repository": { "type": "git", "url": "git+https://github.com/acme/widget.git#master" }
}"#,
        );
        dir
    }

    fn options(dir: &TempDir) -> ScanOptions {
        ScanOptions {
            start: dir.path().to_path_buf(),
            ..ScanOptions::default()
        }
    }

    #[test]
    fn test_scan_package_lock() {
        let dir = project();
        let records = NodeScanner::new().scan(&options(&dir)).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.module_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "@acme/widget@2.0.0",
                "debug@2.6.9",
                "express@4.18.2",
                "fsevents@2.3.3",
                "mystery@0.0.1"
            ]
        );

        let express = &records[2];
        assert_eq!(express.declared_licenses, "MIT");
        assert_eq!(
            express.repository_url.as_deref(),
            Some("https://github.com/expressjs/express")
        );
        assert_eq!(express.publisher.as_deref(), Some("TJ Holowaychuk"));

        let widget = &records[0];
        assert_eq!(widget.declared_licenses, "MIT, Apache-2.0");
        assert_eq!(
            widget.repository_url.as_deref(),
            Some("git+https://github.com/acme/widget.git#master")
        );
        assert_eq!(widget.publisher.as_deref(), Some("Acme Inc."));

        let mystery = &records[4];
        assert_eq!(mystery.declared_licenses, UNKNOWN_LICENSE);
        assert_eq!(mystery.repository_url, None);
        assert_eq!(mystery.publisher, None);
    }

    #[test]
    fn test_scan_options() {
        let dir = project();
        let opts = ScanOptions {
            production: false,
            boolean: true,
            unknown: false,
            exclude_packages: vec!["debug".to_string()],
            exclude_prefixes: vec!["@types".to_string()],
            ..options(&dir)
        };
        let records = NodeScanner::new().scan(&opts).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.module_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["@acme/widget@2.0.0", "express@4.18.2", "fsevents@2.3.3", "jest@29.0.0"]
        );
        assert_eq!(records[0].declared_licenses, "(MIT OR Apache-2.0)");
    }

    #[test]
    fn test_scan_node_modules_without_lock() {
        let dir = project();
        std::fs::remove_file(dir.path().join("package-lock.json")).unwrap();

        let records = NodeScanner::new().scan(&options(&dir)).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.module_id.as_str()).collect();
        assert_eq!(ids, vec!["@acme/widget@2.0.0", "express@4.18.2"]);
    }

    #[test]
    fn test_v1_lock_falls_back_to_node_modules() {
        let dir = project();
        write(
            &dir.path().join("package-lock.json"),
            r#"{
  "name": "my-app",
  "lockfileVersion": 1,
  "dependencies": {
    "express": { "version": "4.18.2" }
  }
}"#,
        );

        let records = NodeScanner::new().scan(&options(&dir)).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.module_id.as_str()).collect();
        assert_eq!(ids, vec!["@acme/widget@2.0.0", "express@4.18.2"]);
        assert_eq!(
            records[1].repository_url.as_deref(),
            Some("https://github.com/expressjs/express")
        );
    }

    #[test]
    fn test_license_forms() {
        assert_eq!(license_from_manifest(&json!({"license": "ISC"}), false), Some("ISC".to_string()));
        assert_eq!(
            license_from_manifest(&json!({"license": {"type": "BSD-3-Clause"}}), false),
            Some("BSD-3-Clause".to_string())
        );
        assert_eq!(
            license_from_manifest(&json!({"licenses": ["MIT"]}), true),
            Some("MIT".to_string())
        );
        assert_eq!(license_from_manifest(&json!({"license": ""}), false), None);
        assert_eq!(license_from_manifest(&json!({}), false), None);
    }

    #[test]
    fn test_repository_shorthands() {
        assert_eq!(expand_shorthand("github:acme/widget"), "https://github.com/acme/widget");
        assert_eq!(expand_shorthand("gitlab:acme/widget"), "https://gitlab.com/acme/widget");
        assert_eq!(expand_shorthand("acme/widget"), "https://github.com/acme/widget");
        assert_eq!(
            expand_shorthand("https://github.com/acme/widget"),
            "https://github.com/acme/widget"
        );
        assert_eq!(repository_from_manifest(&json!({"repository": {"type": "git"}})), None);
    }

    #[test]
    fn test_publisher_forms() {
        assert_eq!(
            publisher_from_manifest(&json!({"author": "Jane Doe (https://jane.test)"})),
            Some("Jane Doe".to_string())
        );
        assert_eq!(publisher_from_manifest(&json!({"author": {"email": "x@y.z"}})), None);
        assert_eq!(publisher_from_manifest(&json!({})), None);
    }
}
