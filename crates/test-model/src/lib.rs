//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use little_chat_model::{ErrorKind, ModelProvider, ModelProviderError};
use tokio::time::{Instant, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.kind.is_retryable().then_some(429)
    }
}

impl From<&PresetFailure> for Error {
    fn from(failure: &PresetFailure) -> Self {
        match failure {
            PresetFailure::RateLimited => Error {
                message: "too many requests".to_owned(),
                kind: ErrorKind::RateLimitExceeded,
            },
            PresetFailure::Other(message) => Error {
                message: message.clone(),
                kind: ErrorKind::Other,
            },
        }
    }
}

/// A call received by [`TestModelProvider`].
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// The prompt of this call.
    pub prompt: String,
    /// When the call was made, on tokio's clock (which can be paused).
    pub at: Instant,
}

#[derive(Default)]
struct Progress {
    step_idx: usize,
    failed_attempts: u64,
    calls: Vec<RecordedCall>,
}

type OnCallFn = Arc<dyn Fn(&str) + Send + Sync>;

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the answer script, which is
/// how the model should respond to the prompts. Each preset answers one
/// prompt, possibly after failing a few times. If there are no enough
/// presets in the script, an error will be returned.
///
/// Clones share the same progress and call records, so a test can keep a
/// clone around to inspect what the code under test has sent.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetAnswer>,
    delay: Option<Duration>,
    on_call: Option<OnCallFn>,
    progress: Arc<Mutex<Progress>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_answer(&mut self, preset: PresetAnswer) {
        self.script.push(preset);
    }

    /// Makes every call take `duration` before it resolves.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Invokes `on_call` synchronously whenever a call is made.
    #[inline]
    pub fn set_on_call(
        &mut self,
        on_call: impl Fn(&str) + Send + Sync + 'static,
    ) {
        self.on_call = Some(Arc::new(on_call));
    }

    /// Returns the calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.progress().calls.clone()
    }

    #[inline]
    pub fn call_count(&self) -> usize {
        self.progress().calls.len()
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        // A panic while holding the lock can only come from a failed
        // assertion in the test itself.
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_result(&self, prompt: &str) -> Result<String, Error> {
        let mut progress = self.progress();
        progress.calls.push(RecordedCall {
            prompt: prompt.to_owned(),
            at: Instant::now(),
        });

        let Some(preset) = self.script.get(progress.step_idx) else {
            return Err(Error {
                message: "no enough presets".to_owned(),
                kind: ErrorKind::Other,
            });
        };

        let should_fail = match preset.failures {
            Some(0) => true,
            Some(failures) => progress.failed_attempts < failures,
            None => false,
        };
        if should_fail {
            progress.failed_attempts += 1;
            return Err(Error::from(&preset.failure));
        }

        progress.step_idx += 1;
        progress.failed_attempts = 0;
        Ok(preset.text.clone())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn answer(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        if let Some(on_call) = &self.on_call {
            on_call(prompt);
        }
        let result = self.next_result(prompt);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_answers_in_order() {
        let mut provider = TestModelProvider::default();
        provider.add_answer(PresetAnswer::with_text("Hello, world!"));
        provider.add_answer(PresetAnswer::with_text("Sure, let me see."));

        assert_eq!(provider.answer("Hi").await.unwrap(), "Hello, world!");
        assert_eq!(
            provider.answer("Check my todo").await.unwrap(),
            "Sure, let me see."
        );

        let err = provider.answer("One more").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        let prompts: Vec<_> =
            provider.calls().into_iter().map(|c| c.prompt).collect();
        assert_eq!(prompts, ["Hi", "Check my todo", "One more"]);
    }

    #[tokio::test]
    async fn test_failures_before_success() {
        let mut provider = TestModelProvider::default();
        provider
            .add_answer(PresetAnswer::with_text("Finally").with_failures(2));

        for _ in 0..2 {
            let err = provider.answer("Hi").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
            assert_eq!(err.status(), Some(429));
        }
        assert_eq!(provider.answer("Hi").await.unwrap(), "Finally");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_always_failing() {
        let mut provider = TestModelProvider::default();
        provider.add_answer(PresetAnswer::always_failing(PresetFailure::Other(
            "provider outage".to_owned(),
        )));

        for _ in 0..5 {
            let err = provider.answer("Hi").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Other);
            assert_eq!(err.message(), "provider outage");
            assert_eq!(err.status(), None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_and_recording() {
        let mut provider = TestModelProvider::default();
        provider.add_answer(PresetAnswer::with_text("Late"));
        provider.set_delay(Duration::from_millis(300));

        let seen = Arc::new(Mutex::new(Vec::new()));
        provider.set_on_call({
            let seen = Arc::clone(&seen);
            move |prompt| seen.lock().unwrap().push(prompt.to_owned())
        });

        let start = Instant::now();
        assert_eq!(provider.clone().answer("Hi").await.unwrap(), "Late");
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert_eq!(*seen.lock().unwrap(), ["Hi"]);
        assert_eq!(provider.calls()[0].at, start);
    }
}
