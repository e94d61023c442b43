//! Report renderers for resolved license records.
//!
//! - [`html`] — standalone HTML table.
//! - [`csv`] — one quoted row per component.
//! - [`terminal`] — colored run summary on stdout.
//!
//! HTML and CSV only contain records with a known public repository.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::ResolvedRecord;

pub mod csv;
pub mod html;
pub mod terminal;

const NOT_AVAILABLE: &str = "N/A";

/// One rendered line of the HTML/CSV reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub component: String,
    pub licenses: String,
    /// Empty when no license file was located.
    pub license_url: String,
    pub publisher: String,
    pub repository: String,
}

impl ReportRow {
    fn from_record(resolved: &ResolvedRecord) -> Self {
        let record = &resolved.record;
        Self {
            component: record.module_id.clone(),
            licenses: record.declared_licenses.clone(),
            license_url: resolved.license_url.clone().unwrap_or_default(),
            publisher: record
                .publisher
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            repository: record
                .repository_url
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

/// Rows for every record with a public repository, in input order.
pub fn report_rows(records: &[ResolvedRecord]) -> Vec<ReportRow> {
    records
        .iter()
        .filter(|r| r.is_reportable())
        .map(ReportRow::from_record)
        .collect()
}

#[derive(Debug)]
pub struct ReportFiles {
    pub html: PathBuf,
    pub csv: PathBuf,
}

/// `foss-licenses-YYYYMMDD`
pub fn file_stem(now: &DateTime<Local>) -> String {
    format!("foss-licenses-{}", now.format("%Y%m%d"))
}

/// Write both reports into `out_dir`.
pub fn write_reports(
    records: &[ResolvedRecord],
    out_dir: &Path,
    now: &DateTime<Local>,
) -> Result<ReportFiles> {
    let rows = report_rows(records);
    let stem = file_stem(now);

    let html_path = out_dir.join(format!("{stem}.html"));
    let generated_on = now.format("%Y-%m-%d %H:%M:%S").to_string();
    std::fs::write(&html_path, html::render(&rows, &generated_on)?)
        .with_context(|| format!("Failed to write HTML report to {}", html_path.display()))?;
    tracing::info!(path = %html_path.display(), "HTML file generated successfully");

    let csv_path = out_dir.join(format!("{stem}.csv"));
    std::fs::write(&csv_path, csv::render(&rows))
        .with_context(|| format!("Failed to write CSV report to {}", csv_path.display()))?;
    tracing::info!(path = %csv_path.display(), "CSV file generated successfully");

    Ok(ReportFiles {
        html: html_path,
        csv: csv_path,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    use crate::models::DependencyRecord;

    pub(crate) fn resolved(
        module_id: &str,
        repository: Option<&str>,
        publisher: Option<&str>,
        license_url: Option<&str>,
    ) -> ResolvedRecord {
        ResolvedRecord {
            record: DependencyRecord {
                module_id: module_id.to_string(),
                declared_licenses: "MIT".to_string(),
                repository_url: repository.map(str::to_string),
                publisher: publisher.map(str::to_string),
            },
            license_url: license_url.map(str::to_string),
        }
    }

    #[test]
    fn test_rows_skip_records_without_repository() {
        let records = vec![
            resolved("a@1.0.0", Some("https://github.com/acme/a"), Some("Acme"), Some("https://github.com/acme/a/blob/main/LICENSE")),
            resolved("b@1.0.0", None, Some("Acme"), None),
            resolved("c@1.0.0", Some("https://gitlab.com/acme/c"), None, None),
        ];

        let rows = report_rows(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].component, "a@1.0.0");
        assert_eq!(rows[1].component, "c@1.0.0");
        assert_eq!(rows[1].license_url, "");
        assert_eq!(rows[1].publisher, "N/A");
    }

    #[test]
    fn test_write_reports() {
        let dir = TempDir::new().unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 7, 9, 30, 0).unwrap();
        let records = vec![
            resolved("a@1.0.0", Some("https://github.com/acme/a"), Some("Acme"), None),
            resolved("hidden@1.0.0", None, None, None),
        ];

        let files = write_reports(&records, dir.path(), &now).unwrap();

        assert_eq!(files.html, dir.path().join("foss-licenses-20240307.html"));
        assert_eq!(files.csv, dir.path().join("foss-licenses-20240307.csv"));

        let html = std::fs::read_to_string(&files.html).unwrap();
        let csv = std::fs::read_to_string(&files.csv).unwrap();
        assert!(html.contains("a@1.0.0"));
        assert!(html.contains("2024-03-07 09:30:00"));
        assert!(!html.contains("hidden@1.0.0"));
        assert!(csv.contains("\"a@1.0.0\""));
        assert!(!csv.contains("hidden@1.0.0"));
    }
}
