use crate::browser::Browser;
use crate::config::RunConfig;
use crate::factory::SessionFactory;
use crate::report::{ReportSink, Severity};
use crate::scenario::{Page, Scenario, ScenarioError, Steps};
use crate::screenshot;
use futures::FutureExt;
use std::path::PathBuf;

/// What a completed run found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub scenario: String,
    pub passed: usize,
    pub failed: usize,
    pub report: Option<PathBuf>,
}

impl RunSummary {
    /// No verification failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs scenarios in sessions opened by a [`SessionFactory`].
#[derive(Debug)]
pub struct Runner<F> {
    config: RunConfig,
    factory: F,
}

impl<F: SessionFactory> Runner<F> {
    pub fn new(config: RunConfig, factory: F) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Opens a session, runs `scenario` in it and logs everything to `report`.
    ///
    /// The session is closed and the report flushed on every exit path. When the scenario
    /// aborts (a failed action or a panic), a screenshot is taken and attached to the report
    /// before the session is closed.
    ///
    /// # Errors
    ///
    /// - [`ScenarioError::Setup`] when no session could be opened.
    /// - [`ScenarioError::Step`] or [`ScenarioError::Panic`] when the scenario aborted.
    /// - [`ScenarioError::Report`] when the report could not be written after an otherwise
    ///   completed run. When the run already failed, that error wins and the failed write is
    ///   only logged.
    pub async fn run<S, R>(&self, scenario: &S, report: &mut R) -> Result<RunSummary, ScenarioError>
    where
        S: Scenario,
        R: ReportSink + ?Sized,
    {
        tracing::info!(
            browser = %self.config.browser,
            private_mode = self.config.private_mode,
            "Starting scenario: {}",
            scenario.name()
        );

        let session = match self
            .factory
            .create_session(self.config.browser, self.config.private_mode)
            .await
        {
            Ok(session) => session,
            Err(source) => {
                let err = ScenarioError::Setup { source };
                report.log(Severity::Fail, &format!("Test failed: {err}"));
                if let Err(flush_err) = report.flush() {
                    tracing::warn!(%flush_err, "Failed to write the report.");
                }
                return Err(err);
            }
        };

        if let Err(err) = session.maximize().await {
            tracing::warn!(%err, "Failed to maximize the browser window.");
        }

        let (outcome, passed, failed) = {
            let mut steps = Steps::new(Page::new(&session, self.config.wait()), report);
            let outcome = core::panic::AssertUnwindSafe(scenario.run(&mut steps))
                .catch_unwind()
                .await;
            (outcome, steps.passed(), steps.failed())
        };

        // Handle panics.
        let outcome = outcome.unwrap_or_else(|panic| {
            let reason = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_owned());
            Err(ScenarioError::Panic { reason })
        });

        if let Err(err) = &outcome {
            tracing::error!(%err, "Scenario aborted.");
            report.log(Severity::Fail, &format!("Test failed: {err}"));
            match screenshot::capture(&session, &self.config.output_dir, "failure").await {
                Ok(path) => report.attach(&path, "failure"),
                Err(err) => tracing::warn!("Failed to capture failure screenshot: {err:#}"),
            }
        }

        // No matter what happened, clean up the session!
        if let Err(err) = session.quit().await {
            tracing::warn!(%err, "Failed to close the browser session.");
        }

        // A failed flush must not hide why the scenario aborted.
        let flushed = report.flush();
        if let Err(err) = outcome {
            if let Err(flush_err) = flushed {
                tracing::warn!(%flush_err, "Failed to write the report.");
            }
            return Err(err);
        }
        flushed?;

        let summary = RunSummary {
            scenario: scenario.name().to_owned(),
            passed,
            failed,
            report: report.location().map(ToOwned::to_owned),
        };
        tracing::info!(
            "Scenario finished: {} passed, {} failed",
            summary.passed,
            summary.failed
        );
        Ok(summary)
    }
}
