//! Terminal table over channel summaries.

use std::fmt::Write as _;

use colored::Colorize;

use crate::report::ChannelSummary;

/// Render the per-channel summary table.
///
/// `top_users` caps the contributors shown per channel (0 = all). Colors
/// respect the global `colored` override, so `--no-color` strips them.
#[must_use]
pub fn render(summaries: &[ChannelSummary], top_users: usize) -> String {
    let name_width = summaries
        .iter()
        .map(|summary| summary.name.len())
        .chain(std::iter::once("CHANNEL".len()))
        .max()
        .unwrap_or(7);

    let mut out = String::new();
    let header = format!(
        "{:<name_width$}  {:>8}  {:>6}  {:>6}  {:>11}  {:>7}  USERS",
        "CHANNEL", "MESSAGES", "MERGED", "CLOSED", "REFLECTIONS", "GRADE",
    );
    let _ = writeln!(out, "{}", header.bold());
    let _ = writeln!(out, "{}", "-".repeat(header.len().max(60)));

    for summary in summaries {
        let grade_cell = format!("{:>7.2}", summary.grade);
        let _ = writeln!(
            out,
            "{:<name_width$}  {:>8}  {:>6}  {:>6}  {:>11}  {}  {}",
            summary.name,
            summary.message_count,
            summary.merged_count,
            summary.closed_count,
            summary.reflection_count,
            grade_color(summary.grade, grade_cell),
            users_cell(summary, top_users),
        );
    }

    if summaries.is_empty() {
        let _ = writeln!(out, "(no channels)");
    }
    out
}

/// Color the pre-padded grade cell so ANSI codes do not skew alignment.
fn grade_color(grade: f64, cell: String) -> String {
    if grade >= 75.0 {
        cell.green().to_string()
    } else if grade >= 40.0 {
        cell.yellow().to_string()
    } else {
        cell.red().to_string()
    }
}

/// Contributors ordered by tally (descending), ties by name.
fn users_cell(summary: &ChannelSummary, top_users: usize) -> String {
    let mut users: Vec<(&String, &u64)> = summary.user_counts.iter().collect();
    users.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let shown = if top_users == 0 {
        users.len()
    } else {
        top_users.min(users.len())
    };
    let mut cell = users[..shown]
        .iter()
        .map(|(name, count)| format!("{name}:{count}"))
        .collect::<Vec<_>>()
        .join(" ");
    if users.len() > shown {
        let _ = write!(cell, " (+{} more)", users.len() - shown);
    }
    cell
}
