/*!
 * Mock translator for tests and dry runs.
 *
 * - `MockProvider::working()` - always succeeds, prefixing the target language
 * - `MockProvider::failing()` - always fails with a transient error
 * - `MockProvider::fail_first(n)` - fails the first `n` calls, then succeeds
 * - `MockProvider::intermittent(n)` - fails every `n`th call
 *
 * Clones share the call log, so a clone handed out as a session still
 * reports to the original.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::errors::ProviderError;

use super::{Translator, TranslatorFactory};

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Source language hint
    pub source_language: String,
    /// Target language
    pub target_language: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails the first `failures` calls, then succeeds
    FailFirst { failures: usize },
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<MockRequest>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
    /// Requests for which the call fails regardless of behavior
    fail_when: Option<fn(&MockRequest) -> bool>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
            fail_when: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Fail every request matching the predicate
    pub fn with_failure_when(mut self, predicate: fn(&MockRequest) -> bool) -> Self {
        self.fail_when = Some(predicate);
        self
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Snapshot of every request received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    fn respond(&self, request: &MockRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => format!("[{}] {}", request.target_language, request.text),
        }
    }

    fn failure(call_number: usize) -> ProviderError {
        ProviderError::RequestFailed(format!("Mock provider failure on call {}", call_number))
    }
}

#[async_trait]
impl Translator for MockProvider {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = MockRequest {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        };

        // 1-based number of this call
        let call_number = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };

        if self.fail_when.is_some_and(|predicate| predicate(&request)) {
            return Err(Self::failure(call_number));
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(&request)),
            MockBehavior::FailFirst { failures } => {
                if call_number <= failures {
                    Err(Self::failure(call_number))
                } else {
                    Ok(self.respond(&request))
                }
            }
            MockBehavior::Intermittent { fail_every } => {
                if call_number % fail_every == 0 {
                    Err(ProviderError::RateLimitExceeded(format!(
                        "Mock provider failure on call {}",
                        call_number
                    )))
                } else {
                    Ok(self.respond(&request))
                }
            }
            MockBehavior::Failing => Err(Self::failure(call_number)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl TranslatorFactory for MockProvider {
    fn open_session(&self) -> Result<Box<dyn Translator>, ProviderError> {
        Ok(Box::new(self.clone()))
    }
}
