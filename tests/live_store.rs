use assertr::prelude::*;
use serial_test::serial;
use std::str::FromStr;
use storefront_scenario::prelude::*;

#[ctor::ctor]
fn init_test_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
#[ignore = "downloads Chrome for Testing and runs against the live store"]
async fn provisioned_chrome_reaches_the_about_page() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = RunConfig::builder().output_dir(dir.path()).build();
    let runner = Runner::new(config.clone(), WebDriverFactory::new(config));
    let scenario = StoreAboutScenario::default();
    let mut report = HtmlReport::create(dir.path(), scenario.name());

    let summary = runner.run(&scenario, &mut report).await?;

    assert_that(summary.report.is_some()).is_true();
    assert_that(report.report().count(Severity::Pass)).is_equal_to(summary.passed);
    Ok(())
}

/// Runs in the browser named by `SCENARIO_BROWSER` against `SCENARIO_WEBDRIVER_URL`.
#[tokio::test(flavor = "multi_thread")]
#[serial]
#[ignore = "needs a running WebDriver server for the selected browser"]
async fn selected_browser_reaches_the_about_page() -> anyhow::Result<()> {
    let browser = match std::env::var("SCENARIO_BROWSER") {
        Ok(name) => BrowserKind::from_str(&name)?,
        Err(_) => BrowserKind::default(),
    };
    let dir = tempfile::tempdir()?;
    let mut config = RunConfig::builder()
        .browser(browser)
        .output_dir(dir.path())
        .build();
    config.webdriver_url = std::env::var("SCENARIO_WEBDRIVER_URL").ok();

    let runner = Runner::new(config.clone(), WebDriverFactory::new(config));
    let mut report = Report::new(browser.to_string());

    let summary = runner
        .run(&StoreAboutScenario::default(), &mut report)
        .await?;

    assert_that(summary.passed + summary.failed).is_equal_to(7);
    Ok(())
}
