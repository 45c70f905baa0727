//! Retrying model calls that were rate limited.

use std::time::Duration;

use little_chat_model::ModelProviderError;
use tokio::time::sleep;

/// Describes how rate-limited calls are retried.
///
/// A call is attempted once, and then re-attempted up to `max_retries`
/// times as long as it keeps failing with
/// [`ErrorKind::RateLimitExceeded`](little_chat_model::ErrorKind). The wait
/// before the first retry is `initial_delay`, and it doubles before each
/// following one. There is no jitter.
///
/// Doubling is unbounded unless a cap is set with
/// [`RetryPolicy::with_max_delay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[inline]
    pub fn no_retry() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Sets how many times a call may be re-attempted.
    #[inline]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the wait before the first retry.
    #[inline]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Caps every single wait to `max_delay`.
    #[inline]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Returns how many times a call may be re-attempted.
    #[inline]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the wait before the `retry`-th retry (0-based), or `None`
    /// if the budget does not allow that many.
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        let delay = 2u32
            .checked_pow(retry)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX);
        Some(match self.max_delay {
            Some(max_delay) => delay.min(max_delay),
            None => delay,
        })
    }

    /// Runs `op` until it succeeds, fails with an error that is not worth
    /// retrying, or the retry budget runs out.
    ///
    /// The error of the last attempt is returned as is.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future stops retrying. The attempt in flight
    /// is dropped with it.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ModelProviderError,
    {
        let mut retry = 0;
        loop {
            let err = match op().await {
                Ok(value) => {
                    if retry > 0 {
                        debug!(retries = retry, "succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.kind().is_retryable() {
                trace!("not retrying: {err}");
                return Err(err);
            }
            let Some(delay) = self.delay_for(retry) else {
                warn!(
                    retries = retry,
                    "still rate limited, giving up: {err}"
                );
                return Err(err);
            };

            debug!(
                retry = retry + 1,
                max_retries = self.max_retries,
                ?delay,
                "rate limited, backing off"
            );
            sleep(delay).await;
            retry += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use little_chat_model::{ErrorKind, ModelProvider};
    use little_chat_test_model::{
        PresetAnswer, PresetFailure, TestModelProvider,
    };
    use tokio::time::Instant;

    use super::*;

    fn gaps(provider: &TestModelProvider) -> Vec<Duration> {
        provider
            .calls()
            .windows(2)
            .map(|w| w[1].at - w[0].at)
            .collect()
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (0..4).map(|i| policy.delay_for(i)).collect();
        assert_eq!(
            delays,
            [
                Some(Duration::from_millis(1000)),
                Some(Duration::from_millis(2000)),
                Some(Duration::from_millis(4000)),
                None,
            ]
        );

        let capped = RetryPolicy::default()
            .with_max_retries(5)
            .with_max_delay(Duration::from_millis(3000));
        assert_eq!(capped.delay_for(1), Some(Duration::from_millis(2000)));
        assert_eq!(capped.delay_for(2), Some(Duration::from_millis(3000)));
        assert_eq!(capped.delay_for(4), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::default().with_max_retries(u32::MAX);
        assert_eq!(policy.delay_for(200), Some(Duration::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_after_very_long_wait() {
        let mut provider = TestModelProvider::default();
        provider.add_answer(PresetAnswer::with_text("ok").with_failures(1));

        // Longer than `u64::MAX` milliseconds.
        let policy = RetryPolicy::default()
            .with_initial_delay(Duration::from_secs(u64::MAX));
        let answer = policy.run(|| provider.answer("Hello")).await.unwrap();

        assert_eq!(answer, "ok");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_rate_limits() {
        let mut provider = TestModelProvider::default();
        provider
            .add_answer(PresetAnswer::with_text("Hi there").with_failures(2));

        let start = Instant::now();
        let answer = RetryPolicy::default()
            .run(|| provider.answer("Hello"))
            .await
            .unwrap();

        assert_eq!(answer, "Hi there");
        assert_eq!(provider.call_count(), 3);
        assert_eq!(
            gaps(&provider),
            [Duration::from_millis(1000), Duration::from_millis(2000)]
        );
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_when_budget_exhausted() {
        let mut provider = TestModelProvider::default();
        provider.add_answer(PresetAnswer::always_failing(
            PresetFailure::RateLimited,
        ));

        let err = RetryPolicy::default()
            .run(|| provider.answer("Hello"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(provider.call_count(), 4);
        assert_eq!(
            gaps(&provider),
            [
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_is_not_retried() {
        let mut provider = TestModelProvider::default();
        provider.add_answer(PresetAnswer::always_failing(PresetFailure::Other(
            "network down".to_owned(),
        )));

        let start = Instant::now();
        let err = RetryPolicy::default()
            .with_max_retries(10)
            .run(|| provider.answer("Hello"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.message(), "network down");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_propagates_immediately() {
        let mut provider = TestModelProvider::default();
        provider.add_answer(PresetAnswer::with_text("never").with_failures(1));

        let start = Instant::now();
        let err = RetryPolicy::no_retry()
            .run(|| provider.answer("Hello"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capped_waits() {
        let mut provider = TestModelProvider::default();
        provider.add_answer(PresetAnswer::with_text("ok").with_failures(4));

        let policy = RetryPolicy::default()
            .with_max_retries(4)
            .with_initial_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_millis(1500));
        let answer = policy.run(|| provider.answer("Hello")).await.unwrap();

        assert_eq!(answer, "ok");
        assert_eq!(
            gaps(&provider),
            [
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(1500),
                Duration::from_millis(1500),
            ]
        );
    }
}
