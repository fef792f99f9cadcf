use crate::browser::Browser;
use crate::report::timestamped;
use anyhow::Context;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Saves a PNG of the current viewport as `<dir>/<name>_<timestamp>.png`.
pub async fn capture<B: Browser>(browser: &B, dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let png = browser
        .screenshot_png()
        .await
        .context("Failed to take screenshot.")?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create screenshot directory {dir:?}."))?;

    let path = dir.join(format!("{}.png", timestamped(name, Local::now())));
    tokio::fs::write(&path, png)
        .await
        .with_context(|| format!("Failed to write screenshot to {path:?}."))?;

    tracing::info!("Screenshot saved to {path:?}");
    Ok(path)
}
