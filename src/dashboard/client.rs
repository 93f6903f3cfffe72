//! The analysis workflow: collect input, submit it, store the outcome.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::state::{RequestToken, Settled, StalePolicy, SubmissionOutcome, UiState};
use crate::classifier::{ClassificationError, ClassificationService};
use crate::models::FileUpload;

/// Owns the view state and runs submissions against a [`ClassificationService`].
///
/// Submissions run on spawned tasks; their outcomes are queued and applied to
/// the state only when the owner calls [`AnalysisClient::settle_next`] or
/// drains the queue from its event loop, so the state is only ever mutated
/// from the owner's loop.
pub struct AnalysisClient {
    state: UiState,
    service: Arc<dyn ClassificationService>,
    require_input: bool,
    outcome_tx: mpsc::UnboundedSender<SubmissionOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<SubmissionOutcome>,
}

impl AnalysisClient {
    pub fn new(service: Arc<dyn ClassificationService>, policy: StalePolicy) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            state: UiState::new(policy),
            service,
            require_input: false,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Refuse to submit when neither URL text nor a file is present.
    pub fn with_require_input(mut self, require: bool) -> Self {
        self.require_input = require;
        self
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn set_url_text(&mut self, text: impl Into<String>) {
        self.state.set_url_text(text);
    }

    pub fn set_selected_file(&mut self, file: Option<FileUpload>) {
        self.state.set_selected_file(file);
    }

    /// Read `path` and make it the selected file.
    ///
    /// On a read error the previous selection is kept and the error is
    /// surfaced in `last_error`. A successful read clears `last_error`.
    pub async fn select_file_path(&mut self, path: &Path) -> Result<(), ClassificationError> {
        match FileUpload::from_path(path).await {
            Ok(file) => {
                debug!("Selected {} ({} bytes)", file.filename, file.len());
                self.state.set_selected_file(Some(file));
                self.state.clear_error();
                Ok(())
            }
            Err(e) => {
                let err = ClassificationError::Io(e);
                self.state.reject(&err);
                Err(err)
            }
        }
    }

    /// Start an analysis of the current form. Returns immediately.
    ///
    /// Nothing prevents a second call while one is in flight; the state's
    /// [`StalePolicy`] decides which outcome ends up displayed.
    pub fn submit_analysis(&mut self) -> Option<RequestToken> {
        if self.require_input && !self.state.has_input() {
            self.state.reject(&ClassificationError::EmptyRequest);
            return None;
        }

        let (token, request) = self.state.begin_submission();
        if request.is_empty() {
            warn!("Submitting analysis {} with neither URL nor file", token);
        }

        let service = Arc::clone(&self.service);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = service.classify(request).await;
            // The receiver lives as long as the client; a send error means the
            // view is gone and nobody is waiting for this outcome.
            let _ = tx.send(SubmissionOutcome { token, result });
        });

        Some(token)
    }

    /// Wait for the next outcome and apply it.
    pub async fn settle_next(&mut self) -> Option<Settled> {
        let outcome = self.outcome_rx.recv().await?;
        Some(self.state.settle(outcome))
    }

    /// Settle outcomes until no submission is in flight.
    pub async fn wait_idle(&mut self) {
        while self.state.in_flight() > 0 {
            if self.settle_next().await.is_none() {
                break;
            }
        }
    }

    /// Mutable access for the event loop's own outcome handling.
    pub(crate) fn outcome_rx(&mut self) -> &mut mpsc::UnboundedReceiver<SubmissionOutcome> {
        &mut self.outcome_rx
    }

    pub(crate) fn settle(&mut self, outcome: SubmissionOutcome) -> Settled {
        self.state.settle(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use super::*;
    use crate::models::{AnalysisRequest, AnalysisResult, SdgChartEntry};

    type Reply = Result<AnalysisResult, ClassificationError>;

    /// Service whose replies are released by the test, one gate per URL.
    struct GatedService {
        gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
        seen: Mutex<Vec<AnalysisRequest>>,
    }

    impl GatedService {
        fn new(urls: &[&str]) -> (Arc<Self>, HashMap<String, oneshot::Sender<Reply>>) {
            let mut senders = HashMap::new();
            let mut receivers = HashMap::new();
            for url in urls {
                let (tx, rx) = oneshot::channel();
                senders.insert(url.to_string(), tx);
                receivers.insert(url.to_string(), rx);
            }
            let service = Arc::new(Self {
                gates: Mutex::new(receivers),
                seen: Mutex::new(Vec::new()),
            });
            (service, senders)
        }
    }

    #[async_trait]
    impl ClassificationService for GatedService {
        async fn classify(&self, request: AnalysisRequest) -> Reply {
            let key = request.url_text.clone().unwrap_or_default();
            self.seen.lock().unwrap().push(request);
            let gate = self.gates.lock().unwrap().remove(&key);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ClassificationError::Transport("dropped".into()))),
                None => Err(ClassificationError::Transport("unexpected call".into())),
            }
        }
    }

    fn result(text: &str) -> AnalysisResult {
        AnalysisResult {
            text: text.to_string(),
            keywords: vec!["a".to_string(), "b".to_string()],
            sdg_classification: "SDG3".to_string(),
            sdg_chart: vec![SdgChartEntry {
                sdg: "SDG3".to_string(),
                count: 2,
            }],
        }
    }

    fn last_text(client: &AnalysisClient) -> Option<&str> {
        client.state().last_result().map(|r| r.text.as_str())
    }

    #[tokio::test]
    async fn test_submit_success_round_trip() {
        let (service, mut gates) = GatedService::new(&["https://example.org/report"]);
        let mut client = AnalysisClient::new(service.clone(), StalePolicy::LatestOnly);
        client.set_url_text("https://example.org/report");

        let token = client.submit_analysis();
        assert_eq!(token, Some(0));
        assert!(client.state().is_submitting());

        gates
            .remove("https://example.org/report")
            .unwrap()
            .send(Ok(result("body")))
            .unwrap();
        assert_eq!(client.settle_next().await, Some(Settled::Applied));
        assert!(!client.state().is_submitting());
        assert_eq!(last_text(&client), Some("body"));

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen[0].url_text.as_deref(), Some("https://example.org/report"));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result() {
        let (service, mut gates) = GatedService::new(&["a", "b"]);
        let mut client = AnalysisClient::new(service, StalePolicy::LatestOnly);

        client.set_url_text("a");
        client.submit_analysis();
        gates.remove("a").unwrap().send(Ok(result("kept"))).unwrap();
        client.wait_idle().await;

        client.set_url_text("b");
        client.submit_analysis();
        assert!(client.state().is_submitting());
        gates
            .remove("b")
            .unwrap()
            .send(Err(ClassificationError::Transport("refused".into())))
            .unwrap();
        assert_eq!(client.settle_next().await, Some(Settled::Failed));

        assert!(!client.state().is_submitting());
        assert_eq!(last_text(&client), Some("kept"));
        assert_eq!(client.state().last_error(), Some("Connection error: refused"));
    }

    #[tokio::test]
    async fn test_overlap_latest_only_keeps_second() {
        let (service, mut gates) = GatedService::new(&["first", "second"]);
        let mut client = AnalysisClient::new(service, StalePolicy::LatestOnly);

        client.set_url_text("first");
        client.submit_analysis();
        client.set_url_text("second");
        client.submit_analysis();

        gates.remove("second").unwrap().send(Ok(result("second"))).unwrap();
        assert_eq!(client.settle_next().await, Some(Settled::Applied));
        gates.remove("first").unwrap().send(Ok(result("first"))).unwrap();
        assert_eq!(client.settle_next().await, Some(Settled::Discarded));

        assert_eq!(last_text(&client), Some("second"));
        assert!(!client.state().is_submitting());
    }

    #[tokio::test]
    async fn test_overlap_apply_all_last_response_wins() {
        let (service, mut gates) = GatedService::new(&["first", "second"]);
        let mut client = AnalysisClient::new(service, StalePolicy::ApplyAll);

        client.set_url_text("first");
        client.submit_analysis();
        client.set_url_text("second");
        client.submit_analysis();

        gates.remove("second").unwrap().send(Ok(result("second"))).unwrap();
        client.settle_next().await;
        gates.remove("first").unwrap().send(Ok(result("first"))).unwrap();
        client.settle_next().await;

        assert_eq!(last_text(&client), Some("first"));
        assert!(!client.state().is_submitting());
    }

    #[tokio::test]
    async fn test_empty_submission_allowed_by_default() {
        let (service, mut gates) = GatedService::new(&[""]);
        let mut client = AnalysisClient::new(service.clone(), StalePolicy::LatestOnly);

        assert!(client.submit_analysis().is_some());
        gates.remove("").unwrap().send(Ok(result("empty"))).unwrap();
        client.wait_idle().await;

        assert!(service.seen.lock().unwrap()[0].is_empty());
        assert_eq!(last_text(&client), Some("empty"));
    }

    #[tokio::test]
    async fn test_require_input_rejects_empty() {
        let (service, _gates) = GatedService::new(&[]);
        let mut client =
            AnalysisClient::new(service.clone(), StalePolicy::LatestOnly).with_require_input(true);

        assert_eq!(client.submit_analysis(), None);
        assert!(!client.state().is_submitting());
        assert!(client.state().last_error().is_some());
        assert!(service.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_select_missing_file_keeps_selection() {
        let (service, _gates) = GatedService::new(&[]);
        let mut client = AnalysisClient::new(service, StalePolicy::LatestOnly);
        client.set_selected_file(Some(FileUpload::new("a.txt", b"a".to_vec())));

        let err = client
            .select_file_path(Path::new("/nonexistent/report.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassificationError::Io(_)));
        assert_eq!(
            client.state().selected_file().map(|f| f.filename.as_str()),
            Some("a.txt")
        );
        assert!(client
            .state()
            .last_error()
            .unwrap()
            .starts_with("Failed to read file"));
    }

    #[tokio::test]
    async fn test_successful_selection_clears_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"climate").unwrap();

        let (service, _gates) = GatedService::new(&[]);
        let mut client = AnalysisClient::new(service, StalePolicy::LatestOnly);
        assert!(client
            .select_file_path(&dir.path().join("missing.txt"))
            .await
            .is_err());
        assert!(client.state().last_error().is_some());

        client.select_file_path(&path).await.unwrap();
        assert!(client.state().last_error().is_none());
        assert_eq!(
            client.state().selected_file().map(|f| f.filename.as_str()),
            Some("notes.txt")
        );
    }

    #[tokio::test]
    async fn test_select_file_path_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let (service, _gates) = GatedService::new(&[]);
        let mut client = AnalysisClient::new(service, StalePolicy::LatestOnly);
        client.select_file_path(&path).await.unwrap();

        let file = client.state().selected_file().unwrap();
        assert_eq!(file.filename, "report.pdf");
        assert_eq!(file.mime, "application/pdf");
        assert_eq!(file.bytes, b"%PDF-1.4");
    }
}
