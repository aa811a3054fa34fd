use std::fmt::Display;
use std::time::Duration;

use tracing::warn;

/// Retry-with-delay policy for bind and connect.
///
/// With no delay the first failure is returned immediately. With a delay the
/// operation is repeated after sleeping, either forever or until
/// `max_attempts` attempts have been made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep between attempts. `None` means fail fast.
    pub delay: Option<Duration>,
    /// Upper bound on attempts, counting the first one. `None` is unbounded.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Give up on the first failure.
    pub fn fail_fast() -> Self {
        Self::default()
    }

    /// Retry every `delay`. A zero delay is treated as fail fast.
    pub fn every(delay: Duration) -> Self {
        Self {
            delay: (!delay.is_zero()).then_some(delay),
            max_attempts: None,
        }
    }

    /// Bound the number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    pub fn is_fail_fast(&self) -> bool {
        self.delay.is_none()
    }

    /// Run `op` under this policy. `op` receives the 1-based attempt number.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> std::result::Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> std::result::Result<T, E>,
    {
        let mut attempt = 1u32;
        loop {
            let err = match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(delay) = self.delay else {
                return Err(err);
            };
            if self.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(err);
            }

            warn!(attempt, ?delay, error = %err, "{what} failed, retrying");
            std::thread::sleep(delay);
            attempt = attempt.saturating_add(1);
        }
    }
}
