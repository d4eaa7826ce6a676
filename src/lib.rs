pub mod config;
pub mod downloader;
pub mod logging;

use anyhow::Context;
use std::io::{self, BufRead, Write};

use config::Settings;
use downloader::Downloader;

const PROMPT: &str = "Enter the URL (video or playlist): ";

fn read_url() -> anyhow::Result<String> {
    print!("{}", PROMPT);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read URL from stdin")?;
    Ok(line.trim().to_string())
}

/// Prompt for a URL, download it, write the failure summary.
/// Item failures are reported in the log file, not through the return value.
pub fn run() -> anyhow::Result<()> {
    logging::init_logging();

    let settings = Settings::from_env();
    tracing::debug!(?settings, "settings loaded");

    let url = read_url()?;
    if url.is_empty() {
        println!("No URL given.");
        return Ok(());
    }

    let downloader = Downloader::from_settings(settings)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let summary = runtime.block_on(downloader.run(&url))?;

    if let Some(report) = &summary.report {
        println!("Failed downloads written to: {}", report.display());
    }
    println!("Download process completed.");
    Ok(())
}
