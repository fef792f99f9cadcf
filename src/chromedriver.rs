use crate::port::{Port, PortRequest, parse_started_port};
use crate::provision::ChromePackage;
use anyhow::Context;
use std::fmt::{Debug, Formatter};
use std::process::ExitStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::RuntimeFlavor;
use tokio_process_tools::broadcast::BroadcastOutputStream;
use tokio_process_tools::{ProcessHandle, TerminateOnDrop, TerminationError};

/// How long chromedriver may take to announce its port.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Grace periods for the interrupt and terminate signals when shutting chromedriver down.
const INTERRUPT_TIMEOUT: Duration = Duration::from_secs(3);
const TERMINATE_TIMEOUT: Duration = Duration::from_secs(3);

/// A spawned chromedriver process.
/// Keep this alive for as long as the browser session that uses it.
///
/// The process is terminated when this value is dropped, so it never outlives a panicking run.
/// Call [`Chromedriver::terminate`] to stop it explicitly and wait for it to exit.
pub struct Chromedriver {
    process: TerminateOnDrop<BroadcastOutputStream>,
    port: Port,
}

impl Debug for Chromedriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chromedriver")
            .field("process", &self.process)
            .field("port", &self.port)
            .finish()
    }
}

impl Chromedriver {
    /// Launches the chromedriver of `package` and waits until it accepts connections.
    ///
    /// # Errors
    ///
    /// When not called from a multithreaded tokio runtime, when the process cannot be spawned,
    /// or when it does not report a port within ten seconds.
    pub async fn launch(package: &ChromePackage, port: PortRequest) -> anyhow::Result<Self> {
        // Termination on drop needs a second worker thread to run on.
        let flavor = tokio::runtime::Handle::current().runtime_flavor();
        if flavor != RuntimeFlavor::MultiThread {
            anyhow::bail!(indoc::formatdoc! {r#"
                Launching chromedriver requires a multithreaded tokio runtime,
                as it is terminated asynchronously when dropped.

                Detected runtime flavor: {flavor:?}.
            "#});
        }

        tracing::info!(
            "Launching chromedriver... {:?}",
            package.chromedriver_executable
        );
        let mut command = Command::new(&package.chromedriver_executable);
        if let PortRequest::Specific(Port(port)) = port {
            command.arg(format!("--port={port}"));
        }
        command.arg("--log-level=INFO");
        apply_creation_flags(&mut command);

        let process = ProcessHandle::spawn("chromedriver", command)
            .context("Failed to spawn chromedriver process.")?;

        let _out_inspector = process.stdout().inspect(|stdout_line| {
            tracing::debug!(stdout_line, "chromedriver log");
        });
        let _err_inspector = process.stderr().inspect(|stderr_line| {
            tracing::debug!(stderr_line, "chromedriver log");
        });

        tracing::info!("Waiting for chromedriver to start...");
        let started_on_port = Arc::new(AtomicU16::new(0));
        let announced = Arc::clone(&started_on_port);
        process
            .stdout()
            .wait_for_with_timeout(
                move |line| match parse_started_port(&line) {
                    Some(Port(port)) => {
                        announced.store(port, Ordering::Release);
                        true
                    }
                    None => false,
                },
                STARTUP_TIMEOUT,
            )
            .await
            .context("chromedriver did not start in time.")?;

        let port = match started_on_port.load(Ordering::Acquire) {
            0 => anyhow::bail!("chromedriver did not announce its port."),
            port => Port(port),
        };

        tracing::info!("chromedriver listening on port {port}");
        Ok(Self {
            process: process.terminate_on_drop(INTERRUPT_TIMEOUT, TERMINATE_TIMEOUT),
            port,
        })
    }

    pub fn port(&self) -> Port {
        self.port
    }

    /// The WebDriver endpoint of this chromedriver.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Interrupts the process, escalating to terminate when it does not exit in time, and
    /// waits for it to exit.
    ///
    /// # Errors
    ///
    /// When the process survived both signals.
    pub async fn terminate(self) -> Result<ExitStatus, TerminationError> {
        tracing::info!("Terminating chromedriver on port {}", self.port);
        self.process
            .terminate(INTERRUPT_TIMEOUT, TERMINATE_TIMEOUT)
            .await
    }
}

#[cfg(target_os = "windows")]
fn apply_creation_flags(command: &mut Command) -> &mut Command {
    // CREATE_NO_WINDOW: chromedriver is a console application and would otherwise pop up a
    // console window. Its output is captured by the process handle instead.
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    command.creation_flags(CREATE_NO_WINDOW)
}

#[cfg(not(target_os = "windows"))]
fn apply_creation_flags(command: &mut Command) -> &mut Command {
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn refuses_to_launch_on_a_current_thread_runtime() {
        let package = ChromePackage {
            chrome_executable: PathBuf::from("/nonexistent/chrome"),
            chromedriver_executable: PathBuf::from("/nonexistent/chromedriver"),
        };

        let err = Chromedriver::launch(&package, PortRequest::Any)
            .await
            .expect_err("current-thread runtime is rejected");

        assert_that(err.to_string()).contains("Detected runtime flavor: CurrentThread.");
    }
}
