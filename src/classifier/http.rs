//! reqwest implementation of [`ClassificationService`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use super::{ClassificationError, ClassificationService};
use crate::config::Settings;
use crate::models::{AnalysisRequest, AnalysisResult, StoredClassifications};

/// Path of the classification endpoint, relative to the service base URL.
pub const CLASSIFY_PATH: &str = "retrieve_classifications";

/// Longest error body excerpt kept in a [`ClassificationError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP client for the classification service.
#[derive(Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: Url,
}

impl HttpClassifier {
    /// Create a client from resolved settings.
    pub fn new(settings: &Settings) -> Result<Self, ClassificationError> {
        let mut builder = Client::builder().user_agent(&settings.user_agent).gzip(true);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    /// Full URL of the classification endpoint.
    pub fn classify_url(&self) -> Url {
        service_url(&self.endpoint, CLASSIFY_PATH)
    }

    /// Fetch the most recently stored classification rows.
    pub async fn latest(&self) -> Result<StoredClassifications, ClassificationError> {
        let url = self.classify_url();
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;
        let body = success_body(resp).await?;
        serde_json::from_slice(&body).map_err(|e| ClassificationError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ClassificationService for HttpClassifier {
    async fn classify(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, ClassificationError> {
        let url = self.classify_url();
        info!(
            "Submitting analysis to {} (url: {}, file: {})",
            url,
            request.url_text.as_deref().unwrap_or("-"),
            request
                .file
                .as_ref()
                .map(|f| f.filename.as_str())
                .unwrap_or("-")
        );

        let form = build_form(request)?;
        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        let body = success_body(resp).await?;
        let result = AnalysisResult::from_json(&body)?;
        debug!(
            "Received {} chars of text, {} keywords, {} chart entries",
            result.text.chars().count(),
            result.keywords.len(),
            result.sdg_chart.len()
        );
        Ok(result)
    }
}

/// Build the multipart payload: `file` when a file is selected, `url` when
/// URL text is present.
fn build_form(request: AnalysisRequest) -> Result<Form, ClassificationError> {
    let mut form = Form::new();
    if let Some(file) = request.file {
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(&file.mime)
            .map_err(|e| {
                ClassificationError::Invalid(format!(
                    "file has bad MIME type '{}': {}",
                    file.mime, e
                ))
            })?;
        form = form.part("file", part);
    }
    if let Some(url) = request.url_text {
        form = form.text("url", url);
    }
    Ok(form)
}

/// Read the body of a successful response, or turn the status into an error.
async fn success_body(resp: Response) -> Result<Vec<u8>, ClassificationError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClassificationError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }
    resp.bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| ClassificationError::Transport(e.to_string()))
}

/// Join `path` onto `base`, treating the base as a directory.
fn service_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    if !url.path().ends_with('/') {
        let with_slash = format!("{}/", url.path());
        url.set_path(&with_slash);
    }
    url.join(path).unwrap_or(url)
}
