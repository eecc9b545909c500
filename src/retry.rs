// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded retry with a fixed delay plus jitter.
//!
//! [`with_retry`] is not tied to region scanning:
//! any unreliable async call can be wrapped with it.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use log::warn;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::RetryError;

/// How many times and how often to retry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Max number of attempts, including the first one.
    ///
    /// `0` is treated as `1`.
    pub max_attempts: usize,

    /// Fixed delay between two attempts.
    pub delay: Duration,

    /// Upper bound of the random extra delay added to `delay`.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            delay: Duration::from_millis(500),
            jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration, jitter: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            jitter,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub(crate) fn attempt_limit(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// The delay before the next attempt: `delay + random(0..=jitter)`.
    pub fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }

        self.delay + rand::rng().random_range(Duration::ZERO..=self.jitter)
    }
}

/// Run `op` until it succeeds, the attempt budget is spent, or `cancel` resolves.
///
/// `op` receives the 1-based attempt number.
/// Every failed attempt but the last is followed by a [`RetryPolicy::next_delay`] sleep.
///
/// `cancel` is polled before the in-flight attempt and the sleep,
/// thus a resolved `cancel` aborts immediately with [`RetryError::Cancelled`].
/// Pass [`std::future::pending()`] for an uncancellable retry.
///
/// On exhaustion, the error of the last attempt is returned in [`RetryError::Exhausted`].
pub async fn with_retry<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    cancel: C,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Future<Output = ()>,
    E: fmt::Display,
{
    let mut cancel = std::pin::pin!(cancel);
    let limit = policy.attempt_limit();

    let mut attempt = 0;
    loop {
        attempt += 1;

        let res = tokio::select! {
            biased;
            _ = &mut cancel => return Err(RetryError::Cancelled),
            res = op(attempt) => res,
        };

        let err = match res {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };

        if attempt >= limit {
            warn!("attempt {}/{} failed: {}; give up", attempt, limit, err);
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.next_delay();
        warn!(
            "attempt {}/{} failed: {}; retry after {:?}",
            attempt, limit, err, delay
        );

        tokio::select! {
            biased;
            _ = &mut cancel => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;

    fn policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_delay(Duration::from_millis(100))
            .with_jitter(Duration::ZERO)
    }

    #[test]
    fn test_default_policy() {
        let p = RetryPolicy::default();
        assert_eq!(30, p.max_attempts);
        assert_eq!(Duration::from_millis(500), p.delay);
        assert_eq!(Duration::from_millis(500), p.jitter);
    }

    #[test]
    fn test_next_delay_within_jitter() {
        let p = RetryPolicy::new(3, Duration::from_millis(200), Duration::from_millis(50));
        for _ in 0..100 {
            let d = p.next_delay();
            assert!(d >= Duration::from_millis(200), "{:?}", d);
            assert!(d <= Duration::from_millis(250), "{:?}", d);
        }

        // Sub-millisecond jitter is kept.
        let p = RetryPolicy::new(3, Duration::from_millis(200), Duration::from_micros(900));
        let mut jittered = false;
        for _ in 0..100 {
            let d = p.next_delay();
            assert!(d <= Duration::from_micros(200_900), "{:?}", d);
            jittered |= d > Duration::from_millis(200);
        }
        assert!(jittered);

        let p = p.with_jitter(Duration::ZERO);
        assert_eq!(Duration::from_millis(200), p.next_delay());
    }

    #[test]
    fn test_policy_serde() -> anyhow::Result<()> {
        let p = policy(5);
        let s = serde_json::to_string(&p)?;
        let got: RetryPolicy = serde_json::from_str(&s)?;
        assert_eq!(p, got);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_first_attempt_ok() {
        let got: Result<u64, RetryError<String>> =
            with_retry(&policy(3), pending(), |_| async { Ok(5) }).await;
        assert_eq!(5, got.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_succeeds_after_failures() {
        let calls = AtomicUsize::new(0);
        let start = Instant::now();

        let got = with_retry(&policy(5), pending(), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(format!("fail-{}", attempt))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(3, got.unwrap());
        assert_eq!(3, calls.load(Ordering::SeqCst));
        // Two sleeps between three attempts.
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_exhausted_returns_last_error() {
        let got: Result<(), _> = with_retry(&policy(4), pending(), |attempt| async move {
            Err(format!("fail-{}", attempt))
        })
        .await;

        match got {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(4, attempts);
                assert_eq!("fail-4", last);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_zero_attempts_runs_once() {
        let calls = AtomicUsize::new(0);
        let got: Result<(), _> = with_retry(&policy(0), pending(), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("no") }
        })
        .await;

        assert!(matches!(got, Err(RetryError::Exhausted { attempts: 1, .. })));
        assert_eq!(1, calls.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_cancelled_during_sleep() {
        let calls = AtomicUsize::new(0);
        let p = policy(30).with_delay(Duration::from_secs(10));
        let start = Instant::now();

        let cancel = tokio::time::sleep(Duration::from_secs(15));

        let got: Result<(), _> = with_retry(&p, cancel, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("unavailable") }
        })
        .await;

        assert!(matches!(got, Err(RetryError::Cancelled)));
        // Attempts at 0s and 10s, cancelled while sleeping toward 20s.
        assert_eq!(2, calls.load(Ordering::SeqCst));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(15), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(20), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_cancelled_during_attempt() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let cancel = async move {
            let _ = rx.await;
        };

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = tx.send(());
        });

        let got: Result<(), RetryError<String>> = with_retry(&policy(3), cancel, |_| async {
            // The attempt never completes on its own.
            pending::<()>().await;
            Ok(())
        })
        .await;

        assert!(matches!(got, Err(RetryError::Cancelled)));
    }
}
