use std::thread;
use std::time::Duration;

use crate::error::FetchResult;

/// Blocks the calling thread between attempts. Swapped out in tests.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never below 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Per-attempt budget handed to the transport.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(400),
            max_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn single_attempt(timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            timeout,
            ..Self::default()
        }
    }

    /// Delay slept after the given failed attempt (1-based): base, 2*base, 4*base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is spent. `op` receives the attempt number and timeout.
    pub fn run<T, F>(&self, sleeper: &dyn Sleeper, mut op: F) -> FetchResult<T>
    where
        F: FnMut(u32, Duration) -> FetchResult<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt, self.timeout) {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() || attempt >= attempts => return Err(err),
                Err(_) => {
                    sleeper.sleep(self.delay_for(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::FetchError;

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, delay: Duration) {
            self.delays.lock().expect("sleeper lock").push(delay);
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn succeeds_on_third_attempt_after_two_delays() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result = policy().run(&sleeper, |attempt, _| {
            calls += 1;
            if attempt < 3 {
                Err(FetchError::Timeout)
            } else {
                Ok("body")
            }
        });
        assert_eq!(result, Ok("body"));
        assert_eq!(calls, 3);
        let delays = sleeper.delays.lock().unwrap().clone();
        assert_eq!(
            delays,
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let result: FetchResult<()> =
            policy().run(&sleeper, |_, _| Err(FetchError::Status(503)));
        assert_eq!(result, Err(FetchError::Status(503)));
        assert_eq!(sleeper.delays.lock().unwrap().len(), 2);
    }

    #[test]
    fn parse_errors_are_not_retried() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result: FetchResult<()> = policy().run(&sleeper, |_, _| {
            calls += 1;
            Err(FetchError::Parse("bad".to_string()))
        });
        assert!(matches!(result, Err(FetchError::Parse(_))));
        assert_eq!(calls, 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[test]
    fn backoff_is_capped() {
        let p = policy();
        assert_eq!(p.delay_for(1), Duration::from_millis(100));
        assert_eq!(p.delay_for(3), Duration::from_millis(250));
        assert_eq!(p.delay_for(40), Duration::from_millis(250));
    }
}
