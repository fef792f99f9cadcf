use crate::browser::BrowserKind;
use crate::port::PortRequest;
use crate::wait::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, Wait};
use chrome_for_testing::api::channel::Channel;
use std::path::PathBuf;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Everything a run needs to know up front.
///
/// ```
/// use storefront_scenario::prelude::*;
///
/// let config = RunConfig::builder()
///     .browser(BrowserKind::Firefox)
///     .webdriver_url("http://localhost:4444")
///     .build();
/// assert!(config.private_mode);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct RunConfig {
    #[builder(default)]
    pub browser: BrowserKind,

    /// Open an incognito/in-private window.
    #[builder(default = true)]
    pub private_mode: bool,

    #[builder(default = true)]
    pub headless: bool,

    /// A running WebDriver server to connect to. When absent, Chrome for Testing is
    /// downloaded and a chromedriver is launched for the run (Chrome only).
    #[builder(default, setter(into, strip_option))]
    pub webdriver_url: Option<String>,

    /// Release channel of the provisioned Chrome for Testing.
    #[builder(default = Channel::Stable)]
    pub chrome_channel: Channel,

    /// Port of the provisioned chromedriver.
    #[builder(default = PortRequest::Any)]
    pub chromedriver_port: PortRequest,

    /// Where reports and screenshots go.
    #[builder(default = default_output_dir(), setter(into))]
    pub output_dir: PathBuf,

    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,

    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub poll_interval: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RunConfig {
    /// The wait policy used for every element lookup of the run.
    pub fn wait(&self) -> Wait {
        Wait::new(self.timeout, self.poll_interval)
    }
}

fn default_output_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
