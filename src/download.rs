use crate::provision::Artifact;
use anyhow::Context;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Downloads the zip archive at `url` into `dir`, unpacks it there and removes the archive.
pub(crate) async fn download_zip(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
    artifact: Artifact,
) -> anyhow::Result<()> {
    tracing::info!("Downloading {artifact:?} from {url:?}...");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .with_context(|| format!("Failed to request {artifact:?} archive."))?;

    let archive_path = dir.join(format!("{}.zip", artifact.file_stem()));
    let mut file = tokio::fs::File::create(&archive_path)
        .await
        .context("Failed to open new file to write downloaded zip into.")?;
    write_file(&mut file, response).await?;
    tracing::info!("Completed {artifact:?} download");

    tracing::info!("Extracting {artifact:?} to {dir:?}...");
    let (archive, target) = (archive_path.clone(), dir.to_owned());
    tokio::task::spawn_blocking(move || extract(&archive, &target))
        .await
        .context("Extraction task panicked.")??;
    tracing::info!("Completed {artifact:?} extraction");

    tokio::fs::remove_file(&archive_path)
        .await
        .context("Failed to remove zip file.")?;

    Ok(())
}

async fn write_file(
    file: &mut tokio::fs::File,
    mut response: reqwest::Response,
) -> anyhow::Result<()> {
    if let Some(content_length) = response.content_length() {
        tracing::info!("Content-Length: {}", content_length);
    }

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }

    file.flush().await?;

    anyhow::Ok(())
}

fn extract(archive: &Path, target: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::open(archive)
        .with_context(|| format!("Failed to open downloaded archive {archive:?}."))?;
    let mut zip = zip::ZipArchive::new(file).context("Downloaded file is not a zip archive.")?;
    zip.extract(target).context("Failed to extract zip file.")?;
    Ok(())
}
