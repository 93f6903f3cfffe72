//! Interactive dashboard command.

use std::sync::Arc;

use crate::classifier::HttpClassifier;
use crate::config::Settings;
use crate::dashboard::{AnalysisClient, DashboardApp};

/// Open the dashboard against the configured service.
pub async fn cmd_dashboard(settings: &Settings) -> anyhow::Result<()> {
    let classifier = HttpClassifier::new(settings)?;
    tracing::info!("Dashboard using {}", classifier.classify_url());

    let client = AnalysisClient::new(Arc::new(classifier), settings.stale_policy)
        .with_require_input(settings.require_input);
    let mut app = DashboardApp::new(client, settings.excerpt_chars);
    app.run().await
}
