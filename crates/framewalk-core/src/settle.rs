//! Waiting for the target thread to become stoppable.
//!
//! After the stop request the thread needs a moment to actually stop; reading
//! its registers before then fails with `ThreadNotStopped`. [`SettlePolicy`]
//! polls the read with a bounded number of attempts and an overall timeout.

use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{FramewalkError, FramewalkResult};

/// Bounded polling for an operation that may report `ThreadNotStopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy
{
    /// Maximum number of tries, including the first one. Zero behaves like one.
    pub attempts: u32,
    /// Pause between tries.
    pub interval: Duration,
    /// No new try starts once this much time would have passed.
    pub timeout: Duration,
}

impl Default for SettlePolicy
{
    fn default() -> Self
    {
        Self::DEFAULT
    }
}

impl SettlePolicy
{
    /// 10 tries, 10 ms apart, 500 ms at most.
    pub const DEFAULT: Self = Self {
        attempts: 10,
        interval: Duration::from_millis(10),
        timeout: Duration::from_millis(500),
    };

    /// Single attempt, no waiting.
    pub const fn once() -> Self
    {
        Self {
            attempts: 1,
            interval: Duration::ZERO,
            timeout: Duration::ZERO,
        }
    }

    /// Run `op` until it stops reporting `ThreadNotStopped` or the policy is exhausted.
    ///
    /// ## Errors
    ///
    /// The last `ThreadNotStopped` when attempts or time run out; any other
    /// error from `op` immediately.
    pub fn poll<T>(&self, mut op: impl FnMut() -> FramewalkResult<T>) -> FramewalkResult<T>
    {
        let started = Instant::now();
        let attempts = self.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op() {
                Err(FramewalkError::ThreadNotStopped(thread)) => {
                    let out_of_time = started.elapsed() + self.interval > self.timeout;
                    if attempt >= attempts || out_of_time {
                        trace!(%thread, attempt, "giving up waiting for thread to stop");
                        return Err(FramewalkError::ThreadNotStopped(thread));
                    }
                    trace!(%thread, attempt, "thread not stopped yet");
                    thread::sleep(self.interval);
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::ThreadId;

    fn not_stopped() -> FramewalkError
    {
        FramewalkError::ThreadNotStopped(ThreadId(7))
    }

    #[test]
    fn test_succeeds_after_retries()
    {
        let policy = SettlePolicy {
            attempts: 5,
            interval: Duration::ZERO,
            timeout: Duration::from_secs(1),
        };
        let mut calls = 0;
        let result = policy.poll(|| {
            calls += 1;
            if calls < 3 { Err(not_stopped()) } else { Ok(calls) }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_gives_up_after_attempts()
    {
        let policy = SettlePolicy {
            attempts: 4,
            interval: Duration::ZERO,
            timeout: Duration::from_secs(1),
        };
        let mut calls = 0;
        let result: FramewalkResult<()> = policy.poll(|| {
            calls += 1;
            Err(not_stopped())
        });
        assert!(matches!(result, Err(FramewalkError::ThreadNotStopped(ThreadId(7)))));
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_other_errors_are_not_retried()
    {
        let policy = SettlePolicy::default();
        let mut calls = 0;
        let result: FramewalkResult<()> = policy.poll(|| {
            calls += 1;
            Err(FramewalkError::InvalidArgument("boom".into()))
        });
        assert!(matches!(result, Err(FramewalkError::InvalidArgument(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_timeout_bounds_attempts()
    {
        let policy = SettlePolicy {
            attempts: 1_000,
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(20),
        };
        let mut calls = 0;
        let result: FramewalkResult<()> = policy.poll(|| {
            calls += 1;
            Err(not_stopped())
        });
        assert!(result.is_err());
        assert!(calls <= 5, "polled {calls} times within a 20ms budget");
    }

    #[test]
    fn test_zero_attempts_still_tries_once()
    {
        let policy = SettlePolicy {
            attempts: 0,
            ..SettlePolicy::once()
        };
        let mut calls = 0;
        let _ = policy.poll(|| {
            calls += 1;
            Ok::<_, FramewalkError>(())
        });
        assert_eq!(calls, 1);
    }
}
