//! Self-contained HTML report: sortable summary table, substring channel
//! filter, and one collapsible raw-log panel per channel.
//!
//! The page carries no external assets; sorting and filtering run
//! client-side over the rendered text and never re-enter the aggregator.
//! All dynamic content is HTML-escaped, including the retained raw logs.

use std::fmt::Write as _;

use html_escape::encode_text;

use crate::aggregate::ChannelReport;
use crate::core::config::ReportConfig;
use crate::ingest::IngestOutcome;
use crate::logger::diagnostics::{Diagnostic, Severity};

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }\n\
table { border-collapse: collapse; margin: 1em 0; }\n\
th, td { border: 1px solid #ccc; padding: 0.4em 0.8em; text-align: left; vertical-align: top; }\n\
th { cursor: pointer; background: #f0f0f0; }\n\
th[data-direction='asc']::after { content: ' \\2191'; }\n\
th[data-direction='desc']::after { content: ' \\2193'; }\n\
input { padding: 0.3em; min-width: 16em; }\n\
details { margin: 0.5em 0; }\n\
pre { background: #f7f7f7; padding: 0.6em; overflow-x: auto; }\n\
.diagnostics li { color: #a40000; }\n";

const SCRIPT: &str = "\
function sortBy(col) {\n\
  const table = document.getElementById('summaryTable');\n\
  const headers = table.querySelectorAll('th');\n\
  const header = headers[col];\n\
  const direction = header.dataset.direction === 'asc' ? 'desc' : 'asc';\n\
  headers.forEach(h => delete h.dataset.direction);\n\
  header.dataset.direction = direction;\n\
  const rows = Array.from(table.querySelectorAll('tbody tr'));\n\
  rows.sort((a, b) => {\n\
    const x = a.cells[col].textContent.trim();\n\
    const y = b.cells[col].textContent.trim();\n\
    const nx = parseFloat(x);\n\
    const ny = parseFloat(y);\n\
    const cmp = (!isNaN(nx) && !isNaN(ny))\n\
      ? nx - ny\n\
      : x.toLowerCase().localeCompare(y.toLowerCase());\n\
    return direction === 'asc' ? cmp : -cmp;\n\
  });\n\
  const tbody = table.querySelector('tbody');\n\
  rows.forEach(r => tbody.appendChild(r));\n\
}\n\
document.getElementById('channelFilter').addEventListener('keyup', function () {\n\
  const needle = this.value.toLowerCase();\n\
  document.querySelectorAll('#summaryTable tbody tr').forEach(row => {\n\
    const name = row.cells[0].textContent.toLowerCase();\n\
    row.style.display = name.includes(needle) ? '' : 'none';\n\
  });\n\
});\n";

/// Render the full report page.
#[must_use]
pub fn render(
    outcome: &IngestOutcome,
    diagnostics: &[Diagnostic],
    config: &ReportConfig,
) -> String {
    let mut page = String::new();
    let title = encode_text(&config.title);

    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );
    let _ = writeln!(
        page,
        "<p class=\"stats\">{} channels \u{b7} {} entries decoded \u{b7} {} skipped \u{b7} {} known users</p>",
        outcome.stats.channels,
        outcome.stats.entries_decoded,
        outcome.stats.entries_skipped,
        outcome.stats.known_users,
    );
    page.push_str(
        "<input type=\"text\" id=\"channelFilter\" placeholder=\"Filter channels\u{2026}\">\n",
    );

    render_summary_table(&mut page, outcome);
    render_log_panels(&mut page, outcome, config);
    render_diagnostics(&mut page, diagnostics);

    let _ = write!(page, "<script>\n{SCRIPT}</script>\n</body>\n</html>\n");
    page
}

fn render_summary_table(page: &mut String, outcome: &IngestOutcome) {
    page.push_str("<table id=\"summaryTable\">\n<thead>\n<tr>");
    for (index, label) in [
        "Channel",
        "Messages",
        "Users",
        "Merged",
        "Closed",
        "Reflections",
        "Grade",
    ]
    .iter()
    .enumerate()
    {
        let _ = write!(page, "<th onclick=\"sortBy({index})\">{label}</th>");
    }
    page.push_str("</tr>\n</thead>\n<tbody>\n");

    for report in outcome.channels.values() {
        let users = report
            .user_counts
            .iter()
            .map(|(name, count)| format!("{}: {count}", encode_text(name)))
            .collect::<Vec<_>>()
            .join("<br>");
        let _ = writeln!(
            page,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
            encode_text(&report.name),
            report.message_count,
            users,
            report.merged_count,
            report.closed_count,
            report.reflection_count,
            report.grade,
        );
    }
    page.push_str("</tbody>\n</table>\n");
}

fn render_log_panels(page: &mut String, outcome: &IngestOutcome, config: &ReportConfig) {
    page.push_str("<h2>Raw logs</h2>\n");
    for report in outcome.channels.values() {
        let _ = writeln!(
            page,
            "<details>\n<summary>{}</summary>",
            encode_text(&report.name)
        );
        for log in &report.logs {
            let pretty = serde_json::to_string_pretty(&log.messages).unwrap_or_default();
            let _ = writeln!(
                page,
                "<h4>File: {}</h4>\n<pre>{}</pre>",
                encode_text(&log.entry_name),
                encode_text(&truncated(&pretty, config.max_log_bytes)),
            );
        }
        page.push_str("</details>\n");
    }
}

fn render_diagnostics(page: &mut String, diagnostics: &[Diagnostic]) {
    let warnings: Vec<&Diagnostic> = diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Warning)
        .collect();
    if warnings.is_empty() {
        return;
    }

    let _ = writeln!(
        page,
        "<details class=\"diagnostics\">\n<summary>Diagnostics ({})</summary>\n<ul>",
        warnings.len()
    );
    for diagnostic in warnings {
        let mut context = String::new();
        if let Some(entry) = &diagnostic.entry {
            let _ = write!(context, " entry={entry}");
        }
        if let Some(channel) = &diagnostic.channel {
            let _ = write!(context, " channel={channel}");
        }
        if let Some(user) = &diagnostic.user {
            let _ = write!(context, " user={user}");
        }
        let _ = writeln!(
            page,
            "<li>{}{}</li>",
            encode_text(&diagnostic.details),
            encode_text(&context),
        );
    }
    page.push_str("</ul>\n</details>\n");
}

/// Cap a rendered log at `max_bytes` (0 = unlimited), cutting on a char
/// boundary and marking the cut.
fn truncated(text: &str, max_bytes: u64) -> String {
    let max = usize::try_from(max_bytes).unwrap_or(usize::MAX);
    if max == 0 || text.len() <= max {
        return text.to_string();
    }
    let mut cut = max;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}\n\u{2026} truncated", &text[..cut])
}
