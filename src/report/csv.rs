use super::ReportRow;

const HEADER: &str = "Component Name,License Title,License URL,Copyrights,Public Repository\n";

/// Render the CSV report: a header line and one fully quoted line per row.
pub fn render(rows: &[ReportRow]) -> String {
    let mut out = String::from(HEADER);

    for row in rows {
        let fields = [
            &row.component,
            &row.licenses,
            &row.license_url,
            &row.publisher,
            &row.repository,
        ];
        let line: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

/// RFC 4180 quoting: wrap in double quotes, double any embedded quote.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
