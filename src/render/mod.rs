//! Read-only projection of an [`AnalysisResult`] for display.
//!
//! [`ResultView`] holds everything the result panel shows; the terminal
//! widgets and the plain-text printer both render from it.

pub mod text;
pub mod widgets;

use chrono::{DateTime, Local};

use crate::models::AnalysisResult;

/// Marker appended to the text excerpt.
pub const ELLIPSIS: &str = "...";

pub const KEYWORD_SEPARATOR: &str = ", ";

/// Action button label.
pub fn button_label(is_submitting: bool) -> &'static str {
    if is_submitting {
        "Analyzing..."
    } else {
        "Analyze"
    }
}

/// First `max_chars` characters of `text` followed by [`ELLIPSIS`].
///
/// The ellipsis is appended even when nothing was cut off.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

/// One bar of the distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartBar<'a> {
    pub label: &'a str,
    pub count: u64,
}

impl ChartBar<'_> {
    /// Tooltip text for this bar.
    pub fn tooltip(&self) -> String {
        format!("{}: {}", self.label, self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView<'a> {
    pub excerpt: String,
    pub keywords: String,
    pub classification: &'a str,
    pub bars: Vec<ChartBar<'a>>,
    /// When the displayed result arrived, if known.
    pub completed_at: Option<DateTime<Local>>,
}

impl<'a> ResultView<'a> {
    pub fn new(result: &'a AnalysisResult, excerpt_chars: usize) -> Self {
        Self {
            excerpt: excerpt(&result.text, excerpt_chars),
            keywords: result.keywords.join(KEYWORD_SEPARATOR),
            classification: &result.sdg_classification,
            bars: result
                .sdg_chart
                .iter()
                .map(|e| ChartBar {
                    label: &e.sdg,
                    count: e.count,
                })
                .collect(),
            completed_at: None,
        }
    }

    pub fn with_completed_at(mut self, at: Option<DateTime<Local>>) -> Self {
        self.completed_at = at;
        self
    }

    /// Panel heading, with the completion time when known.
    pub fn title(&self) -> String {
        match self.completed_at {
            Some(at) => format!("Analysis Results ({})", at.format("%H:%M:%S")),
            None => "Analysis Results".to_string(),
        }
    }

    /// Project an optional result; `None` renders nothing.
    pub fn project(result: Option<&'a AnalysisResult>, excerpt_chars: usize) -> Option<Self> {
        result.map(|r| Self::new(r, excerpt_chars))
    }

    pub fn max_count(&self) -> u64 {
        self.bars.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Y-axis grid values from 0 up to at least `max`, at most `lines + 1` of
/// them, on a whole-number step. The last tick saturates at `u64::MAX`.
pub fn grid_ticks(max: u64, lines: u64) -> Vec<u64> {
    let lines = lines.max(1);
    if max == 0 {
        return vec![0];
    }
    let step = max.div_ceil(lines).max(1);
    (0..=max.div_ceil(step))
        .map(|i| i.saturating_mul(step))
        .collect()
}

/// `value` out of `top`, mapped onto `0..=range` and rounded down.
pub fn scale(value: u64, top: u64, range: u64) -> u64 {
    let scaled = u128::from(value.min(top)) * u128::from(range) / u128::from(top.max(1));
    scaled as u64
}

/// Like [`scale`] but rounded up, so any non-zero value maps to at least 1.
pub fn scale_ceil(value: u64, top: u64, range: u64) -> u64 {
    let scaled =
        (u128::from(value.min(top)) * u128::from(range)).div_ceil(u128::from(top.max(1)));
    scaled as u64
}
