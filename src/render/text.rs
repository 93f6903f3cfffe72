//! Plain terminal output of a [`ResultView`] for the one-shot CLI.

use std::fmt::Write;

use console::style;

use super::{scale_ceil, ResultView};

/// Widest bar drawn by [`format_chart`], in cells.
const MAX_BAR_WIDTH: u64 = 40;

/// Format the result summary and chart.
pub fn format_result(view: &ResultView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style(view.title()).bold());
    let _ = writeln!(out, "{} {}", style("Extracted Text:").bold(), view.excerpt);
    let _ = writeln!(out, "{} {}", style("Keywords:").bold(), view.keywords);
    let _ = writeln!(
        out,
        "{} {}",
        style("SDG Classification:").bold(),
        view.classification
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style("SDG Distribution").bold());
    out.push_str(&format_chart(view));
    out
}

/// Horizontal bar chart, one row per entry, scaled to the largest count.
pub fn format_chart(view: &ResultView<'_>) -> String {
    if view.bars.is_empty() {
        return format!("  {}\n", style("(no chart data)").dim());
    }

    let label_width = view
        .bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);
    let max = view.max_count();

    let mut out = String::new();
    for bar in &view.bars {
        // Any non-zero count gets at least one cell.
        let width = scale_ceil(bar.count, max, MAX_BAR_WIDTH);
        let _ = writeln!(
            out,
            "  {:<label_width$} {} {}",
            bar.label,
            style("█".repeat(width as usize)).green(),
            bar.count,
            label_width = label_width
        );
    }
    out
}
