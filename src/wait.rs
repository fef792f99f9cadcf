use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use typed_builder::TypedBuilder;

/// How long a [`Wait`] polls before giving up, unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between two polls of a [`Wait`], unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Errors a condition may raise while the state it waits for is still settling.
///
/// A [`Wait`] swallows transient errors and polls again. Every other error aborts the wait.
pub trait Transient {
    /// Whether this error only means "not there yet".
    fn is_transient(&self) -> bool;
}

/// Maps the value a condition produced on a single poll to its satisfied output.
///
/// `None` is the "not yet satisfied" sentinel.
pub trait Satisfaction {
    /// The value handed back once the condition holds.
    type Output;

    /// `Some(output)` once satisfied, `None` to keep polling.
    fn satisfied(self) -> Option<Self::Output>;
}

impl Satisfaction for bool {
    type Output = bool;

    fn satisfied(self) -> Option<bool> {
        self.then_some(true)
    }
}

impl<T> Satisfaction for Option<T> {
    type Output = T;

    fn satisfied(self) -> Option<T> {
        self
    }
}

impl<T> Satisfaction for Vec<T> {
    type Output = Vec<T>;

    fn satisfied(self) -> Option<Vec<T>> {
        (!self.is_empty()).then_some(self)
    }
}

/// Why a [`Wait`] ended without a satisfied condition.
#[derive(Debug, Error)]
pub enum WaitError<E> {
    /// The condition did not hold before the timeout elapsed.
    #[error("Timed out after {elapsed:?} waiting for {description}.")]
    Timeout {
        /// What was awaited.
        description: String,

        /// Time spent polling, measured from the first poll.
        elapsed: Duration,

        /// The last transient error observed, if any poll raised one.
        #[source]
        last_error: Option<E>,
    },

    /// The condition raised an error that is not transient.
    #[error(transparent)]
    Condition(E),
}

impl<E> WaitError<E> {
    /// Whether the wait ran out of time (as opposed to failing on a hard error).
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// Polls a condition against a session until it is satisfied or the timeout elapses.
///
/// Polling happens at a constant interval, without backoff. The first poll happens
/// immediately, so an already satisfied condition never sleeps. The last poll is clamped to
/// the deadline, which lets a never satisfied wait end within `[timeout, timeout + interval)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct Wait {
    #[builder(default = DEFAULT_TIMEOUT)]
    timeout: Duration,

    #[builder(default = DEFAULT_POLL_INTERVAL)]
    poll_interval: Duration,
}

impl Default for Wait {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Wait {
    /// A wait with the given `timeout` and `poll_interval`.
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// The time budget of this wait.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The pause between two polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Repeatedly invokes `condition(session)` until it yields a satisfied value.
    ///
    /// `description` names the awaited state in timeout errors and logs.
    ///
    /// # Errors
    ///
    /// - [`WaitError::Timeout`] when the condition is still unsatisfied after the timeout.
    ///   It carries the last transient error raised by the condition.
    /// - [`WaitError::Condition`] as soon as the condition raises a non-transient error.
    pub async fn until<S, O, E, F>(
        &self,
        session: &S,
        description: &str,
        mut condition: F,
    ) -> Result<O::Output, WaitError<E>>
    where
        S: ?Sized,
        O: Satisfaction,
        E: Transient + Display,
        F: AsyncFnMut(&S) -> Result<O, E>,
    {
        let started = Instant::now();
        let mut last_error = None;

        loop {
            match condition(session).await {
                Ok(outcome) => {
                    if let Some(output) = outcome.satisfied() {
                        return Ok(output);
                    }
                }
                Err(err) if err.is_transient() => {
                    tracing::trace!(%err, description, "Condition not ready yet.");
                    last_error = Some(err);
                }
                Err(err) => return Err(WaitError::Condition(err)),
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                tracing::debug!(?elapsed, description, "Wait timed out.");
                return Err(WaitError::Timeout {
                    description: description.to_owned(),
                    elapsed,
                    last_error,
                });
            }

            tokio::time::sleep(self.poll_interval.min(self.timeout - elapsed)).await;
        }
    }
}
