//! Transient state of the dashboard view.
//!
//! Every submission is tagged with a [`RequestToken`]. Outcomes come back
//! tagged with the same token, so responses to superseded submissions can be
//! told apart from the one the user is waiting for.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::ClassificationError;
use crate::models::{AnalysisRequest, AnalysisResult, FileUpload};

/// Monotonically increasing id of one submission.
pub type RequestToken = u64;

/// How outcomes of superseded submissions are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Only the most recently issued submission may update the view.
    #[default]
    LatestOnly,
    /// Every outcome is applied as it arrives; the last response wins.
    ApplyAll,
}

/// Outcome of one submission, reported back to the view.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub token: RequestToken,
    pub result: Result<AnalysisResult, ClassificationError>,
}

/// What [`UiState::settle`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Result stored as the new `last_result`.
    Applied,
    /// Failure recorded in `last_error`; `last_result` untouched.
    Failed,
    /// Outcome belonged to a superseded submission and was dropped.
    Discarded,
}

#[derive(Debug, Default)]
pub struct UiState {
    url_text: String,
    selected_file: Option<FileUpload>,
    last_result: Option<AnalysisResult>,
    last_error: Option<String>,
    completed_at: Option<DateTime<Local>>,
    submitting: bool,
    policy: StalePolicy,
    next_token: RequestToken,
    latest_token: Option<RequestToken>,
    in_flight: usize,
}

impl UiState {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn url_text(&self) -> &str {
        &self.url_text
    }

    pub fn set_url_text(&mut self, text: impl Into<String>) {
        self.url_text = text.into();
    }

    pub fn selected_file(&self) -> Option<&FileUpload> {
        self.selected_file.as_ref()
    }

    /// Replace the selected file. No type or size checks.
    pub fn set_selected_file(&mut self, file: Option<FileUpload>) {
        self.selected_file = file;
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// When `last_result` was stored.
    pub fn completed_at(&self) -> Option<DateTime<Local>> {
        self.completed_at
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Submissions started but not yet settled, superseded ones included.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Whether the form holds URL text or a file.
    pub fn has_input(&self) -> bool {
        !self.url_text.is_empty() || self.selected_file.is_some()
    }

    /// Enter the submitting state and snapshot the form into a request.
    pub fn begin_submission(&mut self) -> (RequestToken, AnalysisRequest) {
        let token = self.next_token;
        self.next_token += 1;
        self.latest_token = Some(token);
        self.in_flight += 1;
        self.submitting = true;
        let request = AnalysisRequest::from_form(&self.url_text, self.selected_file.as_ref());
        debug!("Submission {} started (in flight: {})", token, self.in_flight);
        (token, request)
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Record a failure that happened before anything was sent.
    pub fn reject(&mut self, err: &ClassificationError) {
        warn!("Analysis not submitted: {}", err);
        self.last_error = Some(err.to_string());
    }

    /// Apply the outcome of a submission.
    pub fn settle(&mut self, outcome: SubmissionOutcome) -> Settled {
        self.in_flight = self.in_flight.saturating_sub(1);
        let is_latest = self.latest_token == Some(outcome.token);

        if self.policy == StalePolicy::LatestOnly && !is_latest {
            debug!(
                "Discarding outcome of superseded submission {} (latest: {:?})",
                outcome.token, self.latest_token
            );
            return Settled::Discarded;
        }

        self.submitting = false;
        match outcome.result {
            Ok(result) => {
                debug!("Submission {} succeeded", outcome.token);
                self.last_result = Some(result);
                self.last_error = None;
                self.completed_at = Some(Local::now());
                Settled::Applied
            }
            Err(err) => {
                warn!("Analysis failed: {}", err);
                self.last_error = Some(err.to_string());
                Settled::Failed
            }
        }
    }
}
