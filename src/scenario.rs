//! Step machinery for UI scenarios.
//!
//! A scenario is a fixed, ordered list of steps run through [`Steps`]:
//!
//! - **actions** navigate, type or click. A failed action aborts the scenario.
//! - **verifications** compare what the page shows against what is expected. A failed
//!   verification is logged as [`Severity::Fail`] and the scenario carries on, as
//!   verifications are independent of each other.

use crate::browser::{Browser, BrowserError, ElementState, Locator};
use crate::report::{ReportError, ReportSink, Severity};
use crate::wait::{Wait, WaitError};
use thiserror::Error;

/// Why a single step could not be completed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Wait(#[from] WaitError<BrowserError>),
}

/// Why a scenario run was aborted.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to open a browser session.")]
    Setup {
        #[source]
        source: BrowserError,
    },

    #[error("Step failed: {step}")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },

    #[error("The scenario panicked:\n{reason}")]
    Panic { reason: String },

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass(String),
    Fail(String),
}

impl Verdict {
    /// `Pass(pass)` if `holds`, `Fail(fail)` otherwise.
    pub fn check(holds: bool, pass: impl Into<String>, fail: impl Into<String>) -> Self {
        if holds {
            Verdict::Pass(pass.into())
        } else {
            Verdict::Fail(fail.into())
        }
    }
}

/// Case-insensitive equality, as a human reading the page would judge it.
pub fn eq_ignore_case(actual: &str, expected: &str) -> bool {
    actual.to_lowercase() == expected.to_lowercase()
}

/// A browser session paired with the wait policy used for every lookup.
///
/// Single-element operations wait for the element first and then act exactly once. Clicks and
/// typing are never repeated by a poll.
#[derive(Debug)]
pub struct Page<'a, B> {
    browser: &'a B,
    wait: Wait,
}

impl<'a, B: Browser> Page<'a, B> {
    pub fn new(browser: &'a B, wait: Wait) -> Self {
        Self { browser, wait }
    }

    pub fn browser(&self) -> &'a B {
        self.browser
    }

    pub fn wait(&self) -> &Wait {
        &self.wait
    }

    pub async fn goto(&self, url: &str) -> Result<(), StepError> {
        Ok(self.browser.goto(url).await?)
    }

    /// Text of the first element matching `locator`, once there is one.
    pub async fn text(&self, locator: &Locator) -> Result<String, StepError> {
        Ok(self
            .wait
            .until(self.browser, &locator.to_string(), async |browser| {
                browser.text(locator).await.map(Some)
            })
            .await?)
    }

    /// Texts of all elements matching `locator`, once there are at least `count` of them.
    pub async fn texts_at_least(
        &self,
        locator: &Locator,
        count: usize,
    ) -> Result<Vec<String>, StepError> {
        let description = format!("at least {count} elements matching {locator}");
        Ok(self
            .wait
            .until(self.browser, &description, async |browser| {
                let texts = browser.texts(locator).await?;
                Ok::<_, BrowserError>((texts.len() >= count).then_some(texts))
            })
            .await?)
    }

    /// The current URL, once it contains `fragment`.
    pub async fn url_containing(&self, fragment: &str) -> Result<String, StepError> {
        let description = format!("an URL containing {fragment:?}");
        Ok(self
            .wait
            .until(self.browser, &description, async |browser| {
                let url = browser.current_url().await?;
                Ok::<_, BrowserError>(url.contains(fragment).then_some(url))
            })
            .await?)
    }

    /// State of the first element matching `locator`, once there is one.
    pub async fn state(&self, locator: &Locator) -> Result<ElementState, StepError> {
        Ok(self
            .wait
            .until(self.browser, &locator.to_string(), async |browser| {
                browser.state(locator).await.map(Some)
            })
            .await?)
    }

    pub async fn type_into(&self, locator: &Locator, text: &str) -> Result<(), StepError> {
        self.state(locator).await?;
        Ok(self.browser.clear_and_type(locator, text).await?)
    }

    pub async fn click(&self, locator: &Locator) -> Result<(), StepError> {
        self.state(locator).await?;
        Ok(self.browser.click(locator).await?)
    }

    /// Clicks the first element matching `locator` through JavaScript, once there is one.
    pub async fn script_click_first(&self, locator: &Locator) -> Result<(), StepError> {
        self.state(locator).await?;
        Ok(self.browser.script_click(locator).await?)
    }
}

/// Runs actions and verifications against a [`Page`] and logs each of them.
pub struct Steps<'a, B, R: ?Sized> {
    page: Page<'a, B>,
    report: &'a mut R,
    passed: usize,
    failed: usize,
}

impl<'a, B: Browser, R: ReportSink + ?Sized> Steps<'a, B, R> {
    pub fn new(page: Page<'a, B>, report: &'a mut R) -> Self {
        Self {
            page,
            report,
            passed: 0,
            failed: 0,
        }
    }

    pub fn page(&self) -> &Page<'a, B> {
        &self.page
    }

    /// Verifications that passed so far.
    pub fn passed(&self) -> usize {
        self.passed
    }

    /// Verifications that failed so far.
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn info(&mut self, message: &str) {
        tracing::info!("{message}");
        self.report.log(Severity::Info, message);
    }

    /// Logs `label` and performs the action.
    ///
    /// # Errors
    ///
    /// Any failure of the action, wrapped as [`ScenarioError::Step`]. The scenario must not
    /// continue past it.
    pub async fn action<T, F>(&mut self, label: &str, action: F) -> Result<T, ScenarioError>
    where
        F: AsyncFnOnce(&Page<'a, B>) -> Result<T, StepError>,
    {
        self.info(label);
        action(&self.page)
            .await
            .map_err(|source| ScenarioError::Step {
                step: label.to_owned(),
                source,
            })
    }

    /// Logs `label`, runs the verification and logs its verdict.
    ///
    /// A verification that cannot even be evaluated, e.g. because the awaited element never
    /// shows up, counts as failed. Returns whether the verification passed.
    pub async fn verify<F>(&mut self, label: &str, verification: F) -> bool
    where
        F: AsyncFnOnce(&Page<'a, B>) -> Result<Verdict, StepError>,
    {
        self.info(label);
        let verdict = match verification(&self.page).await {
            Ok(verdict) => verdict,
            Err(err) => Verdict::Fail(format!("{label}: {err}")),
        };

        match verdict {
            Verdict::Pass(message) => {
                tracing::info!("PASS {message}");
                self.report.log(Severity::Pass, &message);
                self.passed += 1;
                true
            }
            Verdict::Fail(message) => {
                tracing::warn!("FAIL {message}");
                self.report.log(Severity::Fail, &message);
                self.failed += 1;
                false
            }
        }
    }
}

/// A fixed, ordered list of steps.
#[allow(async_fn_in_trait)]
pub trait Scenario {
    /// Title of the scenario, used as the report title.
    fn name(&self) -> &str;

    /// Runs all steps.
    ///
    /// # Errors
    ///
    /// The first failed action. Failed verifications are only logged.
    async fn run<B: Browser, R: ReportSink + ?Sized>(
        &self,
        steps: &mut Steps<'_, B, R>,
    ) -> Result<(), ScenarioError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn equality_ignores_case() {
        assert_that(eq_ignore_case("EA SPORTS FC™ 25", "ea sports fc™ 25")).is_true();
        assert_that(eq_ignore_case("FIFA 22", "FIFA 23")).is_false();
    }

    #[test]
    fn verdicts() {
        assert_that(Verdict::check(true, "shown", "hidden"))
            .is_equal_to(Verdict::Pass("shown".to_owned()));
        assert_that(Verdict::check(false, "shown", "hidden"))
            .is_equal_to(Verdict::Fail("hidden".to_owned()));
    }

    #[test]
    fn step_errors_name_the_step() {
        let err = ScenarioError::Step {
            step: "Step 3: Click 'Download' button".to_owned(),
            source: StepError::Browser(BrowserError::NoSuchElement {
                locator: Locator::xpath("//*[@id=\"demoGameBtn\"]/a"),
            }),
        };
        assert_that(err.to_string()).is_equal_to("Step failed: Step 3: Click 'Download' button");
    }
}
