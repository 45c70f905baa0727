use std::error::Error;
use std::fmt::{self, Display};
use std::pin::Pin;
use std::sync::Arc;

use little_chat_model::{ErrorKind, ModelProvider, ModelProviderError};
use tracing::Instrument;

type AnswerResult = Result<String, ModelError>;
type BoxedAnswerFuture = Pin<Box<dyn Future<Output = AnswerResult> + Send>>;
type HandlerFn = Arc<dyn Fn(&str) -> BoxedAnswerFuture + Send + Sync>;

/// The error of a model call, with the provider's own error type erased.
///
/// It keeps the [`ErrorKind`] of the original error, so it can still be
/// classified by [`RetryPolicy`](crate::RetryPolicy).
#[derive(Debug)]
pub struct ModelError(Box<dyn ModelProviderError>);

impl ModelError {
    #[inline]
    fn new<E: ModelProviderError>(err: E) -> Self {
        Self(Box::new(err))
    }

    /// Returns the original error reported by the provider.
    #[inline]
    pub fn get_ref(&self) -> &dyn ModelProviderError {
        &*self.0
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for ModelError {}

impl ModelProviderError for ModelError {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.0.status()
    }
}

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |prompt: &str| {
            let fut = provider.answer(prompt);
            let prompt_len = prompt.len();
            Box::pin(
                async move {
                    trace!(prompt_len, "sending prompt");
                    match fut.await {
                        Ok(answer) => {
                            trace!(answer_len = answer.len(), "got an answer");
                            Ok(answer)
                        }
                        Err(err) => {
                            debug!(kind = ?err.kind(), "got an error: {err}");
                            Err(ModelError::new(err))
                        }
                    }
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Asks the model to answer `prompt`.
    ///
    /// The returned future doesn't borrow the client, so it can be retried
    /// by calling this method again.
    #[inline]
    pub fn answer(
        &self,
        prompt: &str,
    ) -> impl Future<Output = AnswerResult> + Send + 'static {
        (self.handler_fn)(prompt)
    }
}

#[cfg(test)]
mod tests {
    use little_chat_test_model::{
        PresetAnswer, PresetFailure, TestModelProvider,
    };

    use super::*;

    #[tokio::test]
    async fn test_answer() {
        let mut model_provider = TestModelProvider::default();
        for text in ["How are you?", "Fine.", "Bye."] {
            model_provider.add_answer(PresetAnswer::with_text(text));
        }

        let model_client = ModelClient::new(model_provider.clone());

        for expected in ["How are you?", "Fine.", "Bye."] {
            let answer = model_client.clone().answer("Hi").await.unwrap();
            assert_eq!(answer, expected);
        }
        assert_eq!(model_provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_error_keeps_kind() {
        let mut model_provider = TestModelProvider::default();
        model_provider
            .add_answer(PresetAnswer::with_text("ok").with_failures(1));
        model_provider.add_answer(PresetAnswer::always_failing(
            PresetFailure::Other("bad gateway".to_owned()),
        ));
        let model_client = ModelClient::new(model_provider);

        let err = model_client.answer("Hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(err.status(), Some(429));

        assert_eq!(model_client.answer("Hi").await.unwrap(), "ok");

        let err = model_client.answer("Hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.to_string().contains("bad gateway"));
        assert_eq!(err.get_ref().kind(), ErrorKind::Other);
    }
}
