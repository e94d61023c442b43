use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::ResolvedRecord;

use super::ReportFiles;

/// Counts shown in the run summary.
#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub with_repository: usize,
    pub license_found: usize,
    pub license_missing: usize,
}

impl Summary {
    pub fn of(records: &[ResolvedRecord]) -> Self {
        let mut summary = Summary {
            total: records.len(),
            ..Default::default()
        };
        for r in records.iter().filter(|r| r.is_reportable()) {
            summary.with_repository += 1;
            if r.license_url.is_some() {
                summary.license_found += 1;
            } else {
                summary.license_missing += 1;
            }
        }
        summary
    }
}

/// Print the run summary; `verbose` adds a table of every reported component.
pub fn render(records: &[ResolvedRecord], files: &ReportFiles, path: &Path, verbose: bool, quiet: bool) {
    let summary = Summary::of(records);

    if quiet {
        println!(
            "Total: {}  Reported: {}  License found: {}  Missing: {}",
            summary.total,
            summary.with_repository,
            summary.license_found.to_string().green(),
            summary.license_missing.to_string().yellow(),
        );
        return;
    }

    println!(
        "\n {} v{}",
        "foss-licenses".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Scanned: {}\n", path.display());

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Dependencies          : {:>5}", summary.total));
    println!(
        " │  {:<48} │",
        format!("With public repository: {:>5}", summary.with_repository)
    );
    println!(
        " │  {:<48} │",
        format!("{}  License file found  : {:>5}", "✓".green(), summary.license_found)
    );
    println!(
        " │  {:<48} │",
        format!("{}  License file missing: {:>5}", "⚠".yellow(), summary.license_missing)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if verbose && summary.with_repository > 0 {
        render_table(records);
        println!();
    }

    println!(" HTML: {}", files.html.display());
    println!(" CSV:  {}\n", files.csv.display());
}

fn render_table(records: &[ResolvedRecord]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("License URL").add_attribute(Attribute::Bold),
        ]);

    for r in records.iter().filter(|r| r.is_reportable()) {
        let url_cell = match &r.license_url {
            Some(url) => Cell::new(url).fg(Color::Green),
            None => Cell::new("not found").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(r.record.name()),
            Cell::new(r.record.version().unwrap_or("")),
            Cell::new(&r.record.declared_licenses),
            url_cell,
        ]);
    }

    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::resolved;

    #[test]
    fn test_summary_counts() {
        let records = vec![
            resolved("a@1.0.0", Some("https://github.com/acme/a"), None, Some("https://x.test/LICENSE")),
            resolved("b@1.0.0", Some("https://github.com/acme/b"), None, None),
            resolved("c@1.0.0", None, None, None),
        ];

        assert_eq!(
            Summary::of(&records),
            Summary {
                total: 3,
                with_repository: 2,
                license_found: 1,
                license_missing: 1,
            }
        );
    }
}
