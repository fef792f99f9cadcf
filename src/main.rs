//! Runs the store scenario from the command line.
//!
//! ```text
//! storefront-scenario --browser firefox --webdriver-url http://localhost:4444
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use storefront_scenario::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChromeChannel {
    Stable,
    Beta,
    Dev,
    Canary,
}

impl From<ChromeChannel> for Channel {
    fn from(channel: ChromeChannel) -> Self {
        match channel {
            ChromeChannel::Stable => Channel::Stable,
            ChromeChannel::Beta => Channel::Beta,
            ChromeChannel::Dev => Channel::Dev,
            ChromeChannel::Canary => Channel::Canary,
        }
    }
}

/// Search the store and navigate to its "About" page, writing an HTML report.
#[derive(Debug, Parser)]
#[command(name = "storefront-scenario", version, about)]
struct Args {
    /// Browser to run in: chrome, edge or firefox.
    #[arg(long, env = "SCENARIO_BROWSER", default_value = "chrome")]
    browser: BrowserKind,

    /// Directory for reports and screenshots. Defaults to the working directory.
    #[arg(long, env = "SCENARIO_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// WebDriver server to connect to. Without it, Chrome for Testing is provisioned.
    #[arg(long, env = "SCENARIO_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,

    /// Use a regular instead of an incognito/in-private window.
    #[arg(long)]
    no_private: bool,

    /// Release channel of the provisioned Chrome for Testing.
    #[arg(long, value_enum, default_value_t = ChromeChannel::Stable)]
    chrome_channel: ChromeChannel,

    /// Port for the provisioned chromedriver. Any free port by default.
    #[arg(long)]
    chromedriver_port: Option<u16>,

    /// How long to wait for an element or page.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[arg(long, default_value_t = 500)]
    poll_interval_ms: u64,
}

impl Args {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let output_dir = match self.output_dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to determine working directory.")?,
        };
        Ok(RunConfig {
            browser: self.browser,
            private_mode: !self.no_private,
            headless: !self.headed,
            webdriver_url: self.webdriver_url,
            chrome_channel: self.chrome_channel.into(),
            chromedriver_port: self.chromedriver_port.into(),
            output_dir,
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        })
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime.")?;

    runtime.block_on(async {
        let scenario = StoreAboutScenario::default();
        let mut report = HtmlReport::create(&config.output_dir, scenario.name());
        let runner = Runner::new(config.clone(), WebDriverFactory::new(config));

        let summary = runner.run(&scenario, &mut report).await?;
        if let Some(path) = &summary.report {
            println!("Report: {}", path.display());
        }

        let code = if summary.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
        Ok::<_, anyhow::Error>(code)
    })
}
