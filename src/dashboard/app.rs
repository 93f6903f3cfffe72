//! Interactive terminal dashboard.
//!
//! Single event loop: keyboard input and submission outcomes are both
//! handled here, so the view state is only mutated from one place.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tracing::{debug, info};

use super::client::AnalysisClient;
use crate::render::widgets::{draw_dashboard, Focus, FormView};
use crate::render::{button_label, ResultView};

/// Interval between keyboard polls.
const TICK: Duration = Duration::from_millis(50);

pub struct DashboardApp {
    client: AnalysisClient,
    excerpt_chars: usize,
    focus: Focus,
    /// Path typed into the file field; becomes the selection on Enter.
    file_input: String,
    selected_bar: usize,
    should_quit: bool,
}

impl DashboardApp {
    pub fn new(client: AnalysisClient, excerpt_chars: usize) -> Self {
        Self {
            client,
            excerpt_chars,
            focus: Focus::default(),
            file_input: String::new(),
            selected_bar: 0,
            should_quit: false,
        }
    }

    /// Run the dashboard until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        // Restores the terminal on early returns and panics.
        let guard = RestoreGuard::new(|| {
            let _ = restore_terminal();
        });
        execute!(io::stdout(), EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        info!("Dashboard started");
        let result = self.run_loop(&mut terminal).await;

        guard.defuse();
        restore_terminal()?;

        result
    }

    async fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            if self.should_quit {
                break;
            }

            tokio::select! {
                outcome = self.client.outcome_rx().recv() => {
                    if let Some(outcome) = outcome {
                        self.client.settle(outcome);
                        self.clamp_selected_bar();
                    }
                }

                _ = tokio::time::sleep(TICK) => {
                    while event::poll(Duration::ZERO)? {
                        if let Event::Key(key) = event::read()? {
                            self.handle_key(key).await;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Draw the current state into a frame.
    pub fn draw(&self, frame: &mut Frame) {
        let state = self.client.state();
        let form = FormView {
            url_text: state.url_text(),
            file_input: &self.file_input,
            selected_file: state
                .selected_file()
                .map(|f| (f.filename.as_str(), f.len())),
            focus: self.focus,
            button_label: button_label(state.is_submitting()),
            error: state.last_error(),
        };
        let view = ResultView::project(state.last_result(), self.excerpt_chars)
            .map(|v| v.with_completed_at(state.completed_at()));
        draw_dashboard(frame, &form, view.as_ref(), self.selected_bar);
    }

    /// Apply one key press.
    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('u') if ctrl => self.clear_field(),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Enter => self.activate().await,
            KeyCode::Left if self.focus == Focus::Button => {
                self.selected_bar = self.selected_bar.saturating_sub(1);
            }
            KeyCode::Right if self.focus == Focus::Button => {
                self.selected_bar += 1;
                self.clamp_selected_bar();
            }
            KeyCode::Backspace => self.edit(|s| {
                s.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.edit(|s| s.push(c)),
            _ => {}
        }
    }

    async fn activate(&mut self) {
        match self.focus {
            Focus::Url | Focus::Button => {
                if let Some(token) = self.client.submit_analysis() {
                    debug!("Started submission {}", token);
                }
            }
            Focus::File => {
                let trimmed = self.file_input.trim();
                if trimmed.is_empty() {
                    self.client.set_selected_file(None);
                    return;
                }
                let path = PathBuf::from(shellexpand::tilde(trimmed).as_ref());
                // Errors are surfaced through the state's error line.
                let _ = self.client.select_file_path(&path).await;
            }
        }
    }

    /// Edit the focused text field.
    fn edit(&mut self, f: impl FnOnce(&mut String)) {
        match self.focus {
            Focus::Url => {
                let mut text = self.client.state().url_text().to_string();
                f(&mut text);
                self.client.set_url_text(text);
            }
            Focus::File => f(&mut self.file_input),
            Focus::Button => {}
        }
    }

    fn clear_field(&mut self) {
        self.edit(|s| s.clear());
    }

    fn clamp_selected_bar(&mut self) {
        let bars = self
            .client
            .state()
            .last_result()
            .map(|r| r.sdg_chart.len())
            .unwrap_or(0);
        self.selected_bar = self.selected_bar.min(bars.saturating_sub(1));
    }
}

/// Leave raw mode and the alternate screen.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;
    Ok(())
}

/// Runs `restore` on drop, unwinding included, unless defused first.
struct RestoreGuard<F: FnOnce()> {
    restore: Option<F>,
}

impl<F: FnOnce()> RestoreGuard<F> {
    fn new(restore: F) -> Self {
        Self {
            restore: Some(restore),
        }
    }

    fn defuse(mut self) {
        self.restore = None;
    }
}

impl<F: FnOnce()> Drop for RestoreGuard<F> {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::classifier::{ClassificationError, ClassificationService};
    use crate::dashboard::StalePolicy;
    use crate::models::{AnalysisRequest, AnalysisResult, SdgChartEntry};

    /// Answers every request immediately with a fixed chart.
    struct FixedService;

    #[async_trait]
    impl ClassificationService for FixedService {
        async fn classify(
            &self,
            request: AnalysisRequest,
        ) -> Result<AnalysisResult, ClassificationError> {
            Ok(AnalysisResult {
                text: request.url_text.unwrap_or_default(),
                keywords: vec!["solar".to_string()],
                sdg_classification: "SDG7".to_string(),
                sdg_chart: vec![
                    SdgChartEntry {
                        sdg: "SDG7".to_string(),
                        count: 3,
                    },
                    SdgChartEntry {
                        sdg: "SDG13".to_string(),
                        count: 1,
                    },
                ],
            })
        }
    }

    fn app() -> DashboardApp {
        let client = AnalysisClient::new(Arc::new(FixedService), StalePolicy::LatestOnly);
        DashboardApp::new(client, 300)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_text(app: &mut DashboardApp, text: &str) {
        for c in text.chars() {
            app.handle_key(press(KeyCode::Char(c))).await;
        }
    }

    #[tokio::test]
    async fn test_typing_updates_url_text() {
        let mut app = app();
        type_text(&mut app, "https://x.org/q").await;
        app.handle_key(press(KeyCode::Backspace)).await;
        assert_eq!(app.client.state().url_text(), "https://x.org/");

        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL))
            .await;
        assert_eq!(app.client.state().url_text(), "");
    }

    #[tokio::test]
    async fn test_enter_submits_and_outcome_renders() {
        let mut app = app();
        type_text(&mut app, "hello").await;
        app.handle_key(press(KeyCode::Enter)).await;
        assert!(app.client.state().is_submitting());

        app.client.settle_next().await;
        assert!(!app.client.state().is_submitting());

        let mut terminal = Terminal::new(TestBackend::new(80, 40)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buf = terminal.backend().buffer();
        let text: String = (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Extracted Text: hello..."));
        assert!(text.contains("SDG7: 3"));
        assert!(text.contains("[ Analyze ]"));
    }

    #[tokio::test]
    async fn test_chart_selection_is_clamped() {
        let mut app = app();
        app.handle_key(press(KeyCode::Enter)).await;
        app.client.settle_next().await;

        app.handle_key(press(KeyCode::BackTab)).await;
        assert_eq!(app.focus, Focus::Button);
        for _ in 0..5 {
            app.handle_key(press(KeyCode::Right)).await;
        }
        assert_eq!(app.selected_bar, 1);
        app.handle_key(press(KeyCode::Left)).await;
        assert_eq!(app.selected_bar, 0);
    }

    #[tokio::test]
    async fn test_file_field_selects_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "climate action").unwrap();

        let mut app = app();
        app.handle_key(press(KeyCode::Tab)).await;
        assert_eq!(app.focus, Focus::File);
        type_text(&mut app, &path.display().to_string()).await;
        app.handle_key(press(KeyCode::Enter)).await;

        let file = app.client.state().selected_file().unwrap();
        assert_eq!(file.filename, "notes.txt");
        assert_eq!(file.mime, "text/plain");
        // Typing in the file field leaves the URL alone.
        assert_eq!(app.client.state().url_text(), "");
    }

    #[test]
    fn test_restore_guard_runs_on_panic() {
        let restored = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&restored);
        let outcome = std::panic::catch_unwind(move || {
            let _guard = RestoreGuard::new(move || flag.store(true, Ordering::SeqCst));
            panic!("draw failed");
        });
        assert!(outcome.is_err());
        assert!(restored.load(Ordering::SeqCst));
    }

    #[test]
    fn test_defused_guard_does_not_restore() {
        let restored = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&restored);
        let guard = RestoreGuard::new(move || flag.store(true, Ordering::SeqCst));
        guard.defuse();
        assert!(!restored.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_escape_quits() {
        let mut app = app();
        assert!(!app.should_quit);
        app.handle_key(press(KeyCode::Esc)).await;
        assert!(app.should_quit);
    }
}
