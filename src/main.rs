//! SustainLens - SDG classification dashboard.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Run CLI (sets up logging once the command is known)
    sustainlens::cli::run().await
}
