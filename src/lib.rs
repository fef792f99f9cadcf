mod browser;
mod cache;
mod chromedriver;
mod config;
mod download;
mod factory;
mod port;
mod provision;
mod report;
mod runner;
mod scenario;
mod screenshot;
mod store;
mod wait;
#[cfg(feature = "thirtyfour")]
mod webdriver;

pub mod prelude {
    pub use crate::browser::Browser;
    pub use crate::browser::BrowserError;
    pub use crate::browser::BrowserKind;
    pub use crate::browser::ElementState;
    pub use crate::browser::Locator;
    pub use crate::browser::UnsupportedBrowser;
    pub use crate::chromedriver::Chromedriver;
    pub use crate::config::RunConfig;
    pub use crate::factory::SessionFactory;
    pub use crate::port::Port;
    pub use crate::port::PortRequest;
    pub use crate::provision::ChromePackage;
    pub use crate::provision::ChromeProvisioner;
    pub use crate::report::Attachment;
    pub use crate::report::HtmlReport;
    pub use crate::report::LogEntry;
    pub use crate::report::Report;
    pub use crate::report::ReportError;
    pub use crate::report::ReportSink;
    pub use crate::report::Severity;
    pub use crate::runner::RunSummary;
    pub use crate::runner::Runner;
    pub use crate::scenario::Page;
    pub use crate::scenario::Scenario;
    pub use crate::scenario::ScenarioError;
    pub use crate::scenario::StepError;
    pub use crate::scenario::Steps;
    pub use crate::scenario::Verdict;
    pub use crate::scenario::eq_ignore_case;
    pub use crate::screenshot::capture as capture_screenshot;
    pub use crate::store::StoreAboutScenario;
    pub use crate::wait::DEFAULT_POLL_INTERVAL;
    pub use crate::wait::DEFAULT_TIMEOUT;
    pub use crate::wait::Satisfaction;
    pub use crate::wait::Transient;
    pub use crate::wait::Wait;
    pub use crate::wait::WaitError;
    #[cfg(feature = "thirtyfour")]
    pub use crate::webdriver::WebDriverFactory;
    #[cfg(feature = "thirtyfour")]
    pub use crate::webdriver::WebDriverSession;
    pub use chrome_for_testing::api::channel::Channel;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use assertr::prelude::*;
    use serial_test::serial;

    #[ctor::ctor]
    fn init_test_tracing() {
        tracing_subscriber::fmt().with_test_writer().try_init().ok();
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    #[ignore = "downloads Chrome for Testing and opens a real browser"]
    #[cfg(feature = "thirtyfour")]
    async fn provisioned_chrome_session() -> anyhow::Result<()> {
        let factory = WebDriverFactory::new(RunConfig::default());
        let session = factory.create_session(BrowserKind::Chrome, true).await?;

        session.goto("https://store.steampowered.com/about/").await?;

        let url = session.current_url().await?;
        assert_that(url).is_equal_to("https://store.steampowered.com/about/");

        session.quit().await?;

        Ok(())
    }
}
