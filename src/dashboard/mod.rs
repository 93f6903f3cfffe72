//! The dashboard view: its state, the submission workflow and the
//! interactive terminal front end.

mod app;
mod client;
mod state;

pub use app::DashboardApp;
pub use client::AnalysisClient;
pub use state::{RequestToken, Settled, StalePolicy, SubmissionOutcome, UiState};
