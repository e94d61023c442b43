use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

use super::ReportRow;

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>FOSS Licenses</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            line-height: 1.6;
            margin: 0;
            padding: 0;
        }
        header {
            background: #333;
            color: #fff;
            padding: 1em 0;
            text-align: center;
        }
        table {
            width: 100%;
            border-collapse: collapse;
            margin: 1em 0;
        }
        th, td {
            border: 1px solid #ddd;
            padding: 0.5em;
            text-align: left;
        }
        th {
            position: sticky;
            top: 0;
            background-color: #f4f4f4;
        }
    </style>
</head>
<body>
    <header>
        <h1>FOSS Licenses</h1>
        <p>Generated on: {{ generated_on }}</p>
    </header>
    <section>
        <table>
            <tr>
                <th>Component Name</th>
                <th>License Title</th>
                <th>License URL</th>
                <th>Copyrights</th>
                <th>Public Repository</th>
            </tr>
{%- for row in rows %}
            <tr>
                <td>{{ row.component }}</td>
                <td>{{ row.licenses }}</td>
                <td><a href="{% if row.license_url %}{{ row.license_url }}{% else %}#{% endif %}">{{ row.license_url }}</a></td>
                <td>{{ row.publisher }}</td>
                <td><a href="{{ row.repository }}">{{ row.repository }}</a></td>
            </tr>
{%- endfor %}
        </table>
    </section>
</body>
</html>
"##;

const TEMPLATE_NAME: &str = "report.html";

/// Render the HTML report. All values are HTML-escaped.
pub fn render(rows: &[ReportRow], generated_on: &str) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)
        .context("Invalid HTML report template")?;
    // Tera's default escaper also encodes `/`, which mangles every URL
    tera.set_escape_fn(escape_html);

    let mut context = TeraContext::new();
    context.insert("rows", rows);
    context.insert("generated_on", generated_on);

    tera.render(TEMPLATE_NAME, &context)
        .context("Failed to render HTML report")
}

/// Same as `tera::escape_html` except that `/` is left as is.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
