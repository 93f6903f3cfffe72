//! Terminal widgets for the dashboard view.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

use super::{grid_ticks, scale, scale_ceil, ResultView};

/// Number of horizontal grid lines drawn behind the bars.
const GRID_LINES: u64 = 4;

/// Bar heights handed to ratatui are counts rescaled onto `0..=BAR_SCALE`.
const BAR_SCALE: u64 = 1000;

/// Which form control has keyboard focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Url,
    File,
    Button,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Url => Focus::File,
            Focus::File => Focus::Button,
            Focus::Button => Focus::Url,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Url => Focus::Button,
            Focus::File => Focus::Url,
            Focus::Button => Focus::File,
        }
    }
}

/// Everything the input panel shows.
#[derive(Debug, Clone)]
pub struct FormView<'a> {
    pub url_text: &'a str,
    pub file_input: &'a str,
    /// Name and size of the currently selected file.
    pub selected_file: Option<(&'a str, usize)>,
    pub focus: Focus,
    pub button_label: &'static str,
    pub error: Option<&'a str>,
}

/// Draw the whole dashboard: form on top, result panel below when present.
pub fn draw_dashboard(
    frame: &mut Frame,
    form: &FormView<'_>,
    result: Option<&ResultView<'_>>,
    selected_bar: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(9), // Form
            Constraint::Min(0),    // Results
            Constraint::Length(1), // Help
        ])
        .split(frame.area());

    let title = Paragraph::new(Line::from(Span::styled(
        "SustainLens Dashboard",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(title, chunks[0]);

    render_form(frame, chunks[1], form);

    if let Some(view) = result {
        render_result(frame, chunks[2], view, selected_bar);
    }

    let help = Paragraph::new(Line::from(Span::styled(
        "Tab: next field  Enter: analyze / select file  ←→: chart bar  Esc: quit",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, chunks[3]);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Render the URL input, file input, action button and error line.
pub fn render_form(frame: &mut Frame, area: Rect, form: &FormView<'_>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let url = Paragraph::new(form.url_text).block(
        Block::default()
            .title(" Webpage URL ")
            .borders(Borders::ALL)
            .border_style(focus_style(form.focus == Focus::Url)),
    );
    frame.render_widget(url, rows[0]);

    let file_title = match form.selected_file {
        Some((name, size)) => format!(" File: {} ({} bytes) ", name, size),
        None => " File path ".to_string(),
    };
    let file = Paragraph::new(form.file_input).block(
        Block::default()
            .title(file_title)
            .borders(Borders::ALL)
            .border_style(focus_style(form.focus == Focus::File)),
    );
    frame.render_widget(file, rows[1]);

    let button_style = if form.focus == Focus::Button {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Blue)
    };
    let button = Paragraph::new(Line::from(Span::styled(
        format!("[ {} ]", form.button_label),
        button_style,
    )));
    frame.render_widget(button, rows[2]);

    if let Some(error) = form.error {
        let error = Paragraph::new(Line::from(vec![
            Span::styled("✗ ", Style::default().fg(Color::Red)),
            Span::styled(error, Style::default().fg(Color::Red)),
        ]));
        frame.render_widget(error, rows[3]);
    }
}

/// Render the text summary and the SDG distribution chart.
pub fn render_result(frame: &mut Frame, area: Rect, view: &ResultView<'_>, selected_bar: usize) {
    let block = Block::default()
        .title(format!(" {} ", view.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(inner);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let summary = vec![
        Line::from(vec![
            Span::styled("Extracted Text: ", bold),
            Span::raw(view.excerpt.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Keywords: ", bold),
            Span::raw(view.keywords.as_str()),
        ]),
        Line::from(vec![
            Span::styled("SDG Classification: ", bold),
            Span::raw(view.classification),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(summary).wrap(Wrap { trim: false }),
        halves[0],
    );

    render_chart(frame, halves[1], view, selected_bar);
}

/// Bar chart with y-axis grid lines and a tooltip line for the selected bar.
pub fn render_chart(frame: &mut Frame, area: Rect, view: &ResultView<'_>, selected_bar: usize) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "SDG Distribution",
            Style::default().add_modifier(Modifier::BOLD),
        ))),
        rows[0],
    );

    if view.bars.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "(no chart data)",
                Style::default().fg(Color::DarkGray),
            )),
            rows[1],
        );
        return;
    }

    let ticks = grid_ticks(view.max_count(), GRID_LINES);
    let top = ticks.last().copied().unwrap_or(0).max(1);

    // Bars sit above a single label row.
    let plot = rows[1];
    let grid_area = Rect {
        height: plot.height.saturating_sub(1),
        ..plot
    };
    let grid = GridLines::new(&ticks, top);
    let gutter = grid.gutter_width().min(plot.width);
    frame.render_widget(grid, grid_area);
    let bars_area = Rect {
        x: plot.x + gutter,
        width: plot.width - gutter,
        ..plot
    };

    let bar_width = view
        .bars
        .iter()
        .map(|b| b.label.chars().count() as u16)
        .max()
        .unwrap_or(3)
        .clamp(3, 10);

    let bars: Vec<Bar> = view
        .bars
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let style = if i == selected_bar {
                Style::default().fg(Color::LightGreen)
            } else {
                Style::default().fg(Color::Green)
            };
            Bar::default()
                .label(Line::from(b.label))
                .value(scale_ceil(b.count, top, BAR_SCALE))
                .text_value(b.count.to_string())
                .style(style)
                .value_style(style.add_modifier(Modifier::REVERSED))
        })
        .collect();

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .max(BAR_SCALE);
    frame.render_widget(chart, bars_area);

    if let Some(bar) = view.bars.get(selected_bar) {
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("▸ ", Style::default().fg(Color::Yellow)),
                Span::raw(bar.tooltip()),
            ])),
            rows[2],
        );
    }
}

/// Dotted horizontal lines at each grid tick, with the tick value in a
/// left-hand gutter.
pub struct GridLines<'a> {
    ticks: &'a [u64],
    top: u64,
    style: Style,
}

impl<'a> GridLines<'a> {
    pub fn new(ticks: &'a [u64], top: u64) -> Self {
        Self {
            ticks,
            top: top.max(1),
            style: Style::default().fg(Color::DarkGray),
        }
    }

    /// Columns taken by the scale labels plus one separator cell.
    pub fn gutter_width(&self) -> u16 {
        self.top.to_string().len() as u16 + 1
    }
}

impl Widget for GridLines<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let gutter = self.gutter_width().min(area.width);
        let span = u64::from(area.height - 1);
        for &tick in self.ticks {
            let offset = scale(tick, self.top, span);
            let y = area.bottom() - 1 - offset as u16;
            let label = format!("{:>width$}", tick, width = gutter as usize - 1);
            buf.set_stringn(area.left(), y, &label, gutter as usize, self.style);
            if tick == 0 {
                continue;
            }
            for x in area.left() + gutter..area.right() {
                buf[(x, y)].set_symbol("┄").set_style(self.style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use chrono::Local;

    use super::*;
    use crate::models::{AnalysisResult, SdgChartEntry};

    fn buffer_text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn form() -> FormView<'static> {
        FormView {
            url_text: "https://example.org",
            file_input: "",
            selected_file: None,
            focus: Focus::Url,
            button_label: "Analyze",
            error: None,
        }
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            text: "short".to_string(),
            keywords: vec!["a".to_string(), "b".to_string()],
            sdg_classification: "SDG3".to_string(),
            sdg_chart: vec![SdgChartEntry {
                sdg: "SDG3".to_string(),
                count: 2,
            }],
        }
    }

    fn draw(form: &FormView<'_>, result: Option<&AnalysisResult>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 40)).unwrap();
        let view = ResultView::project(result, 300);
        terminal
            .draw(|f| draw_dashboard(f, form, view.as_ref(), 0))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_form_without_result() {
        let text = draw(&form(), None);
        assert!(text.contains("https://example.org"));
        assert!(text.contains("[ Analyze ]"));
        assert!(!text.contains("Analysis Results"));
    }

    #[test]
    fn test_result_panel() {
        let result = result();
        let text = draw(&form(), Some(&result));
        assert!(text.contains("Analysis Results"));
        assert!(text.contains("Extracted Text: short..."));
        assert!(text.contains("Keywords: a, b"));
        assert!(text.contains("SDG Classification: SDG3"));
        assert!(text.contains("SDG3: 2"));
    }

    #[test]
    fn test_error_and_submitting_label() {
        let mut form = form();
        form.button_label = "Analyzing...";
        form.error = Some("Service returned HTTP 500: boom");
        form.selected_file = Some(("report.pdf", 1024));
        let text = draw(&form, None);
        assert!(text.contains("[ Analyzing... ]"));
        assert!(text.contains("Service returned HTTP 500: boom"));
        assert!(text.contains("File: report.pdf (1024 bytes)"));
    }

    #[test]
    fn test_result_title_and_huge_counts() {
        use chrono::TimeZone;

        let mut result = result();
        result.sdg_chart.push(SdgChartEntry {
            sdg: "SDG1".to_string(),
            count: u64::MAX,
        });
        let at = Local.with_ymd_and_hms(2026, 3, 4, 14, 2, 11).single().unwrap();
        let view = ResultView::new(&result, 300).with_completed_at(Some(at));

        let mut terminal = Terminal::new(TestBackend::new(80, 40)).unwrap();
        terminal
            .draw(|f| draw_dashboard(f, &form(), Some(&view), 1))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Analysis Results (14:02:11)"));
        assert!(text.contains(&format!("SDG1: {}", u64::MAX)));
    }

    #[test]
    fn test_grid_lines_rows() {
        let ticks = [0, 1, 2];
        let area = Rect::new(0, 0, 5, 5);
        let mut buf = Buffer::empty(area);
        GridLines::new(&ticks, 2).render(area, &mut buf);
        let text = buffer_text(&buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2 ┄┄┄");
        assert_eq!(lines[1], "     ");
        assert_eq!(lines[2], "1 ┄┄┄");
        assert_eq!(lines[4], "0    ");
    }

    #[test]
    fn test_gutter_fits_widest_label() {
        assert_eq!(GridLines::new(&[0, 5, 10], 10).gutter_width(), 3);
        assert_eq!(GridLines::new(&[0], 0).gutter_width(), 2);
    }

    #[test]
    fn test_focus_cycle() {
        assert_eq!(Focus::Url.next(), Focus::File);
        assert_eq!(Focus::Button.next(), Focus::Url);
        assert_eq!(Focus::Url.prev(), Focus::Button);
    }
}
