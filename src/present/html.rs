//! HTML fragments and the question page.

use crate::db::QueryResult;

/// Escapes text for element content and double- or single-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub(super) const NO_RESULTS_HTML: &str = r#"<div class="no-results">No results found.</div>"#;

/// Renders a result set as a `<table>`; every header and cell is escaped.
pub(super) fn table(result: &QueryResult) -> String {
    if result.is_empty() {
        return NO_RESULTS_HTML.to_string();
    }

    let mut html = String::from("<table class=\"results\">\n<thead><tr>");
    for column in &result.columns {
        html.push_str("<th>");
        html.push_str(&escape_html(&column.name));
        html.push_str("</th>");
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in &result.rows {
        html.push_str("<tr>");
        for value in row {
            html.push_str("<td>");
            html.push_str(&escape_html(&value.to_display_string()));
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");

    if let Some(warning) = result.truncation_warning() {
        html.push_str("\n<div class=\"warning\">");
        html.push_str(&escape_html(&warning));
        html.push_str("</div>");
    }

    html
}

pub(super) fn error_block(message: &str, sql: Option<&str>) -> String {
    let mut html = format!(
        "<div class=\"error\">Error: {}</div>",
        escape_html(message)
    );
    if let Some(sql) = sql {
        html.push_str(&format!(
            "\n<div class=\"sql\"><strong>SQL Query:</strong> <code>{}</code></div>",
            escape_html(sql)
        ));
    }
    html
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Ask a Question</title>
<style>
body { font-family: Arial, sans-serif; background: #f9f9f9; }
.container { max-width: 900px; margin: 40px auto; background: #fff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); padding: 32px 24px; }
textarea { width: 100%; }
table.results { width: 100%; border-collapse: collapse; margin-top: 24px; }
table.results th, table.results td { border: 1px solid #ccc; padding: 6px; }
.error { color: #b00020; margin: 16px 0; }
.no-results, .warning { margin: 16px 0; }
</style>
</head>
<body>
<div class="container">
<h1>Ask a Question</h1>
<form action="/ask" method="post">
<label for="question">Your Question</label>
<textarea id="question" name="question" rows="4" required placeholder="Ask a question about companies...">{question}</textarea>
<button type="submit">Ask</button>
</form>
{body}
<a href="/ask">Ask another question</a>
</div>
</body>
</html>
"#;

/// Fills the page template. `body` is trusted markup; `question` is escaped here.
pub(super) fn page(question: &str, body: &str) -> String {
    // Split first so neither input is ever scanned for placeholders
    let (head, tail) = PAGE_TEMPLATE
        .split_once("{body}")
        .unwrap_or((PAGE_TEMPLATE, ""));
    let head = head.replace("{question}", &escape_html(question));
    format!("{head}{body}{tail}")
}
