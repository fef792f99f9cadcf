use crate::browser::{Browser, BrowserError, BrowserKind, ElementState, Locator};
use crate::chromedriver::Chromedriver;
use crate::config::RunConfig;
use crate::factory::SessionFactory;
use crate::provision::ChromeProvisioner;
use thirtyfour::prelude::*;
use thirtyfour::error::WebDriverErrorInner;
use thirtyfour::{Capabilities, ChromiumLikeCapabilities};

/// Where Edge and Firefox sessions connect to unless a WebDriver URL is configured.
const MSEDGEDRIVER_URL: &str = "http://localhost:9515";
const GECKODRIVER_URL: &str = "http://localhost:4444";

/// A browser session driven through a WebDriver server.
///
/// When the server is a chromedriver provisioned for this session, it is terminated together
/// with the session.
#[derive(Debug)]
pub struct WebDriverSession {
    driver: WebDriver,
    chromedriver: Option<Chromedriver>,
}

impl WebDriverSession {
    /// The underlying `thirtyfour` driver, for anything the [`Browser`] trait does not cover.
    pub fn driver(&self) -> &WebDriver {
        &self.driver
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<WebElement>, BrowserError> {
        self.driver
            .find_all(by(locator))
            .await
            .map_err(element_error(locator))
    }

    async fn find_first(&self, locator: &Locator) -> Result<WebElement, BrowserError> {
        self.find_all(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::NoSuchElement {
                locator: locator.clone(),
            })
    }
}

/// Maps WebDriver errors about the element behind `locator` to their [`BrowserError`]
/// counterparts, so that waits can tell "not there yet" from a broken session.
fn element_error(locator: &Locator) -> impl FnOnce(WebDriverError) -> BrowserError + '_ {
    move |err| match err.as_inner() {
        WebDriverErrorInner::NoSuchElement(_) => BrowserError::NoSuchElement {
            locator: locator.clone(),
        },
        WebDriverErrorInner::ElementNotInteractable(_) => BrowserError::NotInteractable {
            locator: locator.clone(),
        },
        WebDriverErrorInner::StaleElementReference(_) => BrowserError::StaleElement {
            locator: locator.clone(),
        },
        _ => err.into(),
    }
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::Id(id) => By::Id(id.as_str()),
        Locator::Css(selector) => By::Css(selector.as_str()),
        Locator::XPath(expression) => By::XPath(expression.as_str()),
        Locator::ClassName(class) => By::ClassName(class.as_str()),
    }
}

impl Browser for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.driver
            .goto(url)
            .await
            .map_err(|err| BrowserError::Navigation {
                url: url.to_owned(),
                reason: err.to_string(),
            })
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn maximize(&self) -> Result<(), BrowserError> {
        Ok(self.driver.maximize_window().await?)
    }

    async fn text(&self, locator: &Locator) -> Result<String, BrowserError> {
        let element = self.find_first(locator).await?;
        element.text().await.map_err(element_error(locator))
    }

    async fn texts(&self, locator: &Locator) -> Result<Vec<String>, BrowserError> {
        let mut texts = Vec::new();
        for element in self.find_all(locator).await? {
            texts.push(element.text().await.map_err(element_error(locator))?);
        }
        Ok(texts)
    }

    async fn state(&self, locator: &Locator) -> Result<ElementState, BrowserError> {
        let element = self.find_first(locator).await?;
        Ok(ElementState {
            displayed: element
                .is_displayed()
                .await
                .map_err(element_error(locator))?,
            enabled: element
                .is_enabled()
                .await
                .map_err(element_error(locator))?,
        })
    }

    async fn clear_and_type(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let element = self.find_first(locator).await?;
        element.clear().await.map_err(element_error(locator))?;
        element
            .send_keys(text)
            .await
            .map_err(element_error(locator))
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self.find_first(locator).await?;
        element.click().await.map_err(element_error(locator))
    }

    async fn script_click(&self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self.find_first(locator).await?;
        self.driver
            .execute("arguments[0].click();", vec![element.to_json()?])
            .await
            .map_err(element_error(locator))?;
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, BrowserError> {
        Ok(self.driver.screenshot_as_png().await?)
    }

    async fn quit(self) -> Result<(), BrowserError> {
        let quit = self.driver.quit().await;
        if let Some(chromedriver) = self.chromedriver
            && let Err(err) = chromedriver.terminate().await
        {
            tracing::warn!(%err, "Failed to terminate chromedriver.");
        }
        Ok(quit?)
    }
}

/// Opens [`WebDriverSession`]s as configured by a [`RunConfig`].
///
/// Chrome connects to the configured WebDriver URL or, if none is given, gets a freshly
/// provisioned Chrome for Testing and chromedriver. Edge and Firefox always connect to a
/// WebDriver server (`msedgedriver` on port 9515, `geckodriver` on port 4444 by default).
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    config: RunConfig,
}

impl WebDriverFactory {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    async fn connect(
        &self,
        url: &str,
        caps: impl Into<Capabilities>,
        chromedriver: Option<Chromedriver>,
    ) -> Result<WebDriverSession, BrowserError> {
        tracing::info!("Opening WebDriver session at {url}");
        let driver = WebDriver::new(url, caps).await?;
        Ok(WebDriverSession {
            driver,
            chromedriver,
        })
    }

    async fn provision_chrome(&self) -> anyhow::Result<(Chromedriver, String)> {
        let provisioner = ChromeProvisioner::new()?;
        let package = provisioner
            .install_latest(self.config.chrome_channel)
            .await?;
        let chromedriver = Chromedriver::launch(&package, self.config.chromedriver_port).await?;
        let binary = package
            .chrome_executable
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Chrome path {package:?} is not valid unicode."))?
            .to_owned();
        Ok((chromedriver, binary))
    }
}

impl SessionFactory for WebDriverFactory {
    type Session = WebDriverSession;

    async fn create_session(
        &self,
        kind: BrowserKind,
        private_mode: bool,
    ) -> Result<WebDriverSession, BrowserError> {
        let headless = self.config.headless;
        let configured_url = self.config.webdriver_url.as_deref();

        match kind {
            BrowserKind::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                if private_mode {
                    caps.add_arg("--incognito")?;
                }
                if headless {
                    caps.set_headless()?;
                }
                match configured_url {
                    Some(url) => self.connect(url, caps, None).await,
                    None => {
                        let (chromedriver, binary) =
                            self.provision_chrome()
                                .await
                                .map_err(|err| BrowserError::Provisioning {
                                    source: err.into(),
                                })?;
                        caps.set_binary(&binary)?;
                        let url = chromedriver.url();
                        self.connect(&url, caps, Some(chromedriver)).await
                    }
                }
            }
            BrowserKind::Edge => {
                let mut caps = DesiredCapabilities::edge();
                if private_mode {
                    caps.add_arg("--inprivate")?;
                }
                if headless {
                    caps.set_headless()?;
                }
                self.connect(configured_url.unwrap_or(MSEDGEDRIVER_URL), caps, None)
                    .await
            }
            BrowserKind::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                if private_mode {
                    caps.add_arg("-private")?;
                }
                if headless {
                    caps.set_headless()?;
                }
                self.connect(configured_url.unwrap_or(GECKODRIVER_URL), caps, None)
                    .await
            }
        }
    }
}
