use crate::wait::Transient;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// The browsers a session can be opened in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserKind {
    #[default]
    Chrome,
    Edge,
    Firefox,
}

/// A browser name that none of the [`BrowserKind`]s answer to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported browser: {0}")]
pub struct UnsupportedBrowser(pub String);

impl FromStr for BrowserKind {
    type Err = UnsupportedBrowser;

    /// Case-insensitive, e.g. `"Chrome"`, `"edge"` or `"FIREFOX"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "edge" => Ok(BrowserKind::Edge),
            "firefox" => Ok(BrowserKind::Firefox),
            _ => Err(UnsupportedBrowser(s.to_owned())),
        }
    }
}

impl Display for BrowserKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Edge => "edge",
            BrowserKind::Firefox => "firefox",
        })
    }
}

/// How to find elements on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(String),
    Css(String),
    XPath(String),
    ClassName(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    pub fn class_name(class: impl Into<String>) -> Self {
        Self::ClassName(class.into())
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{id}"),
            Locator::Css(selector) => write!(f, "css `{selector}`"),
            Locator::XPath(expression) => write!(f, "xpath `{expression}`"),
            Locator::ClassName(class) => write!(f, ".{class}"),
        }
    }
}

/// Observable state of an element.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ElementState {
    pub displayed: bool,
    pub enabled: bool,
}

impl ElementState {
    /// Displayed and enabled, so a user could click it.
    pub fn is_clickable(&self) -> bool {
        self.displayed && self.enabled
    }
}

/// Errors raised while talking to a browser session.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("No element matches {locator}.")]
    NoSuchElement { locator: Locator },

    #[error("Element {locator} cannot be interacted with yet.")]
    NotInteractable { locator: Locator },

    /// The element was found, but the page re-rendered it before it could be used.
    #[error("Element {locator} went stale.")]
    StaleElement { locator: Locator },

    #[error("Failed to navigate to {url:?}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Failed to provision a browser.")]
    Provisioning {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[cfg(feature = "thirtyfour")]
    #[error("thirtyfour WebDriverError")]
    WebDriver {
        #[from]
        source: thirtyfour::error::WebDriverError,
    },
}

impl Transient for BrowserError {
    /// Only "the element is not there (or not usable) yet" is worth polling again.
    /// Everything else, e.g. a crashed session, fails the wait right away.
    fn is_transient(&self) -> bool {
        matches!(
            self,
            BrowserError::NoSuchElement { .. }
                | BrowserError::NotInteractable { .. }
                | BrowserError::StaleElement { .. }
        )
    }
}

/// A live browser session. Used to control the browser.
///
/// Every operation addresses elements by [`Locator`]. Operations on a single element use the
/// first match and fail with [`BrowserError::NoSuchElement`] when nothing matches.
#[allow(async_fn_in_trait)]
pub trait Browser: Sized {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn maximize(&self) -> Result<(), BrowserError>;

    /// Visible text of the first element matching `locator`.
    async fn text(&self, locator: &Locator) -> Result<String, BrowserError>;

    /// Visible text of every element matching `locator`, in document order.
    /// Empty when nothing matches.
    async fn texts(&self, locator: &Locator) -> Result<Vec<String>, BrowserError>;

    async fn state(&self, locator: &Locator) -> Result<ElementState, BrowserError>;

    /// Clears the first element matching `locator` and types `text` into it.
    async fn clear_and_type(&self, locator: &Locator, text: &str) -> Result<(), BrowserError>;

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError>;

    /// Clicks the first element matching `locator` through JavaScript, bypassing overlays.
    async fn script_click(&self, locator: &Locator) -> Result<(), BrowserError>;

    async fn screenshot_png(&self) -> Result<Vec<u8>, BrowserError>;

    /// Closes the session.
    async fn quit(self) -> Result<(), BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn parses_browser_kinds_ignoring_case() {
        assert_that("Chrome".parse::<BrowserKind>())
            .is_ok()
            .is_equal_to(BrowserKind::Chrome);
        assert_that("EDGE".parse::<BrowserKind>())
            .is_ok()
            .is_equal_to(BrowserKind::Edge);
        assert_that(" firefox ".parse::<BrowserKind>())
            .is_ok()
            .is_equal_to(BrowserKind::Firefox);
    }

    #[test]
    fn rejects_unknown_browsers() {
        assert_that("safari".parse::<BrowserKind>())
            .is_err()
            .derive(|it| it.to_string())
            .is_equal_to("Unsupported browser: safari");
    }

    #[test]
    fn only_missing_or_busy_elements_are_transient() {
        assert_that(
            BrowserError::NoSuchElement {
                locator: Locator::id("about_header_area"),
            }
            .is_transient(),
        )
        .is_true();
        assert_that(
            BrowserError::NotInteractable {
                locator: Locator::css(".match_app"),
            }
            .is_transient(),
        )
        .is_true();
        assert_that(
            BrowserError::StaleElement {
                locator: Locator::css(".match_app"),
            }
            .is_transient(),
        )
        .is_true();
        assert_that(
            BrowserError::Navigation {
                url: "https://store.steampowered.com/".to_owned(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_owned(),
            }
            .is_transient(),
        )
        .is_false();
    }
}
