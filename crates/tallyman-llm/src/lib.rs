//! Tallyman Classification Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `tallyman-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `GeminiProvider`: Gemini `generateContent` HTTP integration
//!
//! # Examples
//!
//! ```
//! use tallyman_llm::MockProvider;
//! use tallyman_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("{\"ok\": true}");
//! let result = provider.generate("classify this").unwrap();
//! assert_eq!(result, "{\"ok\": true}");
//! ```

#![warn(missing_docs)]

pub mod gemini;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tallyman_domain::traits::LlmProvider as LlmProviderTrait;
use thiserror::Error;

pub use gemini::GeminiProvider;

/// Errors that can occur while talking to the classification service
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network failure or non-200 HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not match the expected envelope shape
    #[error("Malformed response envelope: {0}")]
    Envelope(String),

    /// The service answered with an empty candidates array
    #[error("Classifier returned no candidates")]
    EmptyCandidates,
}

/// Canned outcome queued into a [`MockProvider`]
enum MockReply {
    Text(String),
    Fail(LlmError),
}

/// Mock classification provider for deterministic testing
///
/// Returns queued responses in FIFO order without making any network calls,
/// falling back to a fixed default once the queue is drained. Every prompt
/// passed to [`generate`](LlmProviderTrait::generate) is captured so tests
/// can assert on the exact outgoing payload.
///
/// # Examples
///
/// ```
/// use tallyman_llm::MockProvider;
/// use tallyman_domain::traits::LlmProvider;
///
/// let provider = MockProvider::new("default");
/// provider.push_response("first");
/// assert_eq!(provider.generate("prompt a").unwrap(), "first");
/// assert_eq!(provider.generate("prompt b").unwrap(), "default");
/// assert_eq!(provider.call_count(), 2);
/// assert_eq!(provider.last_prompt().unwrap(), "prompt b");
/// ```
#[derive(Clone)]
pub struct MockProvider {
    default_response: String,
    queue: Arc<Mutex<VecDeque<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed fallback response
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response to be returned by the next unanswered call
    pub fn push_response(&self, response: impl Into<String>) {
        self.queue
            .lock()
            .unwrap()
            .push_back(MockReply::Text(response.into()));
    }

    /// Queue a transport failure for the next unanswered call
    pub fn push_transport_error(&self, detail: impl Into<String>) {
        self.queue
            .lock()
            .unwrap()
            .push_back(MockReply::Fail(LlmError::Transport(detail.into())));
    }

    /// Queue an empty-candidates failure for the next unanswered call
    pub fn push_empty_candidates(&self) {
        self.queue
            .lock()
            .unwrap()
            .push_back(MockReply::Fail(LlmError::EmptyCandidates));
    }

    /// Number of times generate was called
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// The most recent prompt passed to generate, if any
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    /// All prompts passed to generate, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        match self.queue.lock().unwrap().pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(e)) => Err(e),
            None => Ok(self.default_response.clone()),
        }
    }
}
