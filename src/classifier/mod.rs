//! Client side of the external SDG classification service.
//!
//! The service does text extraction, keyword extraction and classification;
//! this module only ships the request and decodes the response.

mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnalysisRequest, AnalysisResult, ResultShapeError};

pub use http::{HttpClassifier, CLASSIFY_PATH};

/// Something that can turn an [`AnalysisRequest`] into an [`AnalysisResult`].
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Submit one request. Single attempt, no retries.
    async fn classify(&self, request: AnalysisRequest)
        -> Result<AnalysisResult, ClassificationError>;
}

/// Errors that can occur while talking to the classification service.
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// Failed to reach the service
    #[error("Connection error: {0}")]
    Transport(String),
    /// Service answered with a non-success status
    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Body was not the expected JSON shape
    #[error("Malformed response: {0}")]
    Decode(String),
    /// Response decoded but violates result invariants, or the upload
    /// carries values the form encoder rejects
    #[error("Invalid data: {0}")]
    Invalid(String),
    /// Could not read the selected file
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    /// Neither a URL nor a file was given and input is required
    #[error("Enter a URL or choose a file to analyze")]
    EmptyRequest,
}

impl From<ResultShapeError> for ClassificationError {
    fn from(err: ResultShapeError) -> Self {
        match err {
            ResultShapeError::Decode(msg) => ClassificationError::Decode(msg),
            ResultShapeError::Invalid(msg) => ClassificationError::Invalid(msg),
        }
    }
}
