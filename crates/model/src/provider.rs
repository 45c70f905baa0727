use std::error::Error;

use crate::error::ErrorKind;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns the transport status code, if the failure came with one.
    ///
    /// This is diagnostic only, callers should decide what to do based on
    /// [`ModelProviderError::kind`].
    fn status(&self) -> Option<u16> {
        None
    }
}

/// A type that represents a model provider, which turns a text prompt
/// into a text completion.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Asks the model to answer `prompt`.
    ///
    /// The returned future must not borrow from `self` or `prompt`, so
    /// callers can drive it from anywhere.
    fn answer(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static;
}
