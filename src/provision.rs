use crate::cache::CacheDir;
use crate::download;
use anyhow::Context;
use chrome_for_testing::api::Download;
use chrome_for_testing::api::channel::Channel;
use chrome_for_testing::api::last_known_good_versions::VersionInChannel;
use chrome_for_testing::api::platform::Platform;
use chrome_for_testing::api::version::Version;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Artifact {
    Chrome,
    ChromeDriver,
}

impl Artifact {
    pub(crate) fn file_stem(self) -> &'static str {
        match self {
            Artifact::Chrome => "chrome",
            Artifact::ChromeDriver => "chromedriver",
        }
    }
}

/// The Chrome for Testing build picked for a release channel.
#[derive(Debug)]
pub(crate) struct SelectedVersion {
    channel: Channel,
    version: Version,
    chrome: Option<Download>,
    chromedriver: Option<Download>,
}

impl From<(VersionInChannel, Platform)> for SelectedVersion {
    fn from((v, p): (VersionInChannel, Platform)) -> Self {
        let chrome = v.downloads.chrome.iter().find(|d| d.platform == p).cloned();
        let chromedriver = v
            .downloads
            .chromedriver
            .iter()
            .find(|d| d.platform == p)
            .cloned();

        SelectedVersion {
            channel: v.channel,
            version: v.version,
            chrome,
            chromedriver,
        }
    }
}

/// Installed Chrome and chromedriver executables.
#[derive(Debug, Clone)]
pub struct ChromePackage {
    pub chrome_executable: PathBuf,
    pub chromedriver_executable: PathBuf,
}

/// Resolves, downloads and caches Chrome for Testing builds.
#[derive(Debug)]
pub struct ChromeProvisioner {
    client: reqwest::Client,
    cache_dir: CacheDir,
    platform: Platform,
}

impl ChromeProvisioner {
    /// # Errors
    ///
    /// When the per-user cache directory cannot be created.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            cache_dir: CacheDir::get_or_create()?,
            platform: Platform::detect(),
        })
    }

    /// Makes sure the latest Chrome and chromedriver of `channel` are installed.
    ///
    /// # Errors
    ///
    /// When the version cannot be resolved, or a download or extraction fails.
    pub async fn install_latest(&self, channel: Channel) -> anyhow::Result<ChromePackage> {
        let selected = self.resolve(channel).await?;
        self.install(selected).await
    }

    pub(crate) async fn resolve(&self, channel: Channel) -> anyhow::Result<SelectedVersion> {
        let all = chrome_for_testing::api::last_known_good_versions::request(self.client.clone())
            .await
            .context("Failed to request latest versions.")?;
        all.channels
            .get(&channel)
            .cloned()
            .map(|v| SelectedVersion::from((v, self.platform)))
            .with_context(|| format!("No {channel} version of Chrome for Testing is published."))
    }

    pub(crate) async fn install(&self, selected: SelectedVersion) -> anyhow::Result<ChromePackage> {
        let chrome_download = selected.chrome.clone().with_context(|| {
            format!(
                "No chrome download found for {selected:?} using platform {}",
                self.platform
            )
        })?;
        let chromedriver_download = selected.chromedriver.clone().with_context(|| {
            format!(
                "No chromedriver download found for {selected:?} using platform {}",
                self.platform
            )
        })?;

        let platform_dir = self
            .cache_dir
            .path()
            .join(selected.version.to_string())
            .join(self.platform.to_string());
        tokio::fs::create_dir_all(&platform_dir).await?;

        let package = ChromePackage {
            chrome_executable: chrome_executable(&platform_dir, self.platform),
            chromedriver_executable: platform_dir
                .join(format!("chromedriver-{}", self.platform))
                .join(self.platform.chromedriver_binary_name()),
        };

        for (artifact, download, executable) in [
            (
                Artifact::Chrome,
                &chrome_download,
                &package.chrome_executable,
            ),
            (
                Artifact::ChromeDriver,
                &chromedriver_download,
                &package.chromedriver_executable,
            ),
        ] {
            if executable.is_file() {
                tracing::info!(
                    "{artifact:?} {} already installed at {executable:?}...",
                    selected.version
                );
                continue;
            }
            tracing::info!(
                "Installing {} {artifact:?} {}",
                selected.channel,
                selected.version
            );
            download::download_zip(&self.client, &download.url, &platform_dir, artifact).await?;
        }

        Ok(package)
    }
}

fn chrome_executable(platform_dir: &Path, platform: Platform) -> PathBuf {
    let unpack_dir = platform_dir.join(format!("chrome-{platform}"));
    match platform {
        Platform::Linux64 | Platform::MacX64 => unpack_dir.join("chrome"),
        Platform::MacArm64 => unpack_dir
            .join("Google Chrome for Testing.app")
            .join("Contents")
            .join("MacOS")
            .join("Google Chrome for Testing"),
        Platform::Win32 | Platform::Win64 => unpack_dir.join("chrome.exe"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;
    use serial_test::serial;

    #[ctor::ctor]
    fn init_test_tracing() {
        tracing_subscriber::fmt().with_test_writer().try_init().ok();
    }

    #[test]
    fn chrome_lives_in_the_platform_specific_unpack_dir() {
        let dir = Path::new("/cache/131.0.6778.85/linux64");
        assert_that(chrome_executable(dir, Platform::Linux64))
            .is_equal_to(PathBuf::from("/cache/131.0.6778.85/linux64/chrome-linux64/chrome"));
    }

    #[tokio::test]
    #[serial]
    #[ignore = "downloads Chrome for Testing"]
    async fn installs_latest_stable() -> anyhow::Result<()> {
        let provisioner = ChromeProvisioner::new()?;
        let package = provisioner.install_latest(Channel::Stable).await?;

        assert_that(package.chrome_executable).exists().is_a_file();
        assert_that(package.chromedriver_executable)
            .exists()
            .is_a_file();
        Ok(())
    }
}
