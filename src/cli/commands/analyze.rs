//! One-shot analysis command.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::classifier::HttpClassifier;
use crate::cli::icons::{dim_arrow, error, info, success, warn};
use crate::config::Settings;
use crate::dashboard::{AnalysisClient, UiState};
use crate::render::{button_label, text::format_result, ResultView};

/// Submit the given URL and/or file and print the result.
pub async fn cmd_analyze(
    settings: &Settings,
    url: Option<String>,
    file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let classifier = HttpClassifier::new(settings)?;
    let endpoint = classifier.classify_url();
    let mut client = AnalysisClient::new(Arc::new(classifier), settings.stale_policy)
        .with_require_input(settings.require_input);

    if let Some(url) = url {
        client.set_url_text(url);
    }
    if let Some(path) = file {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        client.select_file_path(Path::new(&expanded)).await?;
    }

    if warns_empty_request(client.state(), settings.require_input) {
        eprintln!(
            "{} Neither --url nor --file given; sending an empty request",
            warn()
        );
    }

    eprintln!("{} Submitting to {}", info(), endpoint);
    if let Some(file) = client.state().selected_file() {
        eprintln!(
            "  {} {} ({}, {} bytes)",
            dim_arrow(),
            file.filename,
            file.mime,
            file.len()
        );
    }

    if client.submit_analysis().is_none() {
        let msg = client.state().last_error().unwrap_or("Submission rejected");
        eprintln!("{} {}", error(), msg);
        anyhow::bail!("{}", msg);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(button_label(client.state().is_submitting()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    client.wait_idle().await;
    spinner.finish_and_clear();

    let state = client.state();
    if let Some(msg) = state.last_error() {
        eprintln!("{} {}", error(), msg);
        anyhow::bail!("Analysis failed: {}", msg);
    }

    let Some(result) = state.last_result() else {
        anyhow::bail!("Analysis finished without a result");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        eprintln!("{} Analysis complete", success());
        let view = ResultView::new(result, settings.excerpt_chars)
            .with_completed_at(state.completed_at());
        print!("{}", format_result(&view));
        if view.bars.is_empty() {
            eprintln!("{}", style("Service returned no chart data").dim());
        }
    }

    Ok(())
}

/// An empty form is only sent, and so only worth a warning, when input is
/// not required.
fn warns_empty_request(state: &UiState, require_input: bool) -> bool {
    !require_input && !state.has_input()
}
