//! Request and result types exchanged with the classification service.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Filename sent in the multipart part.
    pub filename: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
    /// MIME type sent with the part.
    pub mime: String,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            filename,
            bytes,
            mime,
        }
    }

    /// Read a file from disk. The filename is the path's final component.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(filename, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Content can be megabytes; keep debug output to the metadata.
impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Input for one analysis call.
///
/// Both fields are optional; the service decides what an empty request means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub url_text: Option<String>,
    pub file: Option<FileUpload>,
}

impl AnalysisRequest {
    /// Build a request from raw form values. Empty URL text counts as absent.
    pub fn from_form(url_text: &str, file: Option<&FileUpload>) -> Self {
        Self {
            url_text: (!url_text.is_empty()).then(|| url_text.to_string()),
            file: file.cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url_text.is_none() && self.file.is_none()
    }
}

/// One bar of the SDG distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdgChartEntry {
    /// SDG label, e.g. "SDG3".
    pub sdg: String,
    pub count: u64,
}

/// Decoded response of the classification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Text extracted from the page or file.
    pub text: String,
    pub keywords: Vec<String>,
    pub sdg_classification: String,
    pub sdg_chart: Vec<SdgChartEntry>,
}

impl AnalysisResult {
    /// Decode and validate a response body.
    pub fn from_json(body: &[u8]) -> Result<Self, ResultShapeError> {
        let result: Self =
            serde_json::from_slice(body).map_err(|e| ResultShapeError::Decode(e.to_string()))?;
        result.validate()?;
        Ok(result)
    }

    /// Check the invariants the renderer relies on.
    pub fn validate(&self) -> Result<(), ResultShapeError> {
        if let Some(pos) = self.sdg_chart.iter().position(|e| e.sdg.trim().is_empty()) {
            return Err(ResultShapeError::Invalid(format!(
                "sdg_chart[{}] has an empty label",
                pos
            )));
        }
        Ok(())
    }
}

/// Why a response body could not become an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResultShapeError {
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid response: {0}")]
    Invalid(String),
}

/// Response of `GET /retrieve_classifications`: the latest stored rows.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoredClassifications {
    #[serde(default)]
    pub stored_data: Vec<Vec<serde_json::Value>>,
}

impl StoredClassifications {
    /// Flatten each row into display strings.
    pub fn rows(&self) -> Vec<String> {
        self.stored_data
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect()
    }
}
