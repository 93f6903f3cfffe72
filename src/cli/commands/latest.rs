//! Show the classification most recently stored by the service.

use console::style;

use crate::classifier::HttpClassifier;
use crate::cli::icons::{error, warn};
use crate::config::Settings;

pub async fn cmd_latest(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let classifier = HttpClassifier::new(settings)?;

    let stored = match classifier.latest().await {
        Ok(stored) => stored,
        Err(e) => {
            eprintln!("{} {}", error(), e);
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    let rows = stored.rows();
    if rows.is_empty() {
        println!("{} No stored classifications", warn());
        return Ok(());
    }

    println!("{}", style("Latest Classification").bold());
    println!("{}", "-".repeat(40));
    for row in rows {
        println!("{}", row);
    }
    Ok(())
}
