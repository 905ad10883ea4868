//! Mock Generation Client for testing and offline runs.
//!
//! Provides a configurable implementation of the GenerationClient port,
//! allowing tests and local runs to work without calling a real AI API.
//!
//! # Features
//!
//! - Pre-configured drafts, consumed in order
//! - Simulated delays for timeout testing
//! - Error injection for failure-path testing
//! - Call tracking for verification
//!
//! Once the queue is exhausted, the mock echoes the request brief back as a
//! draft, so a server started with the mock provider stays usable.
//!
//! # Example
//!
//! ```ignore
//! let client = MockGenerationClient::new()
//!     .with_response("Good evening, jazz lovers!")
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = client.generate(request).await?;
//! assert_eq!(response.content, "Good evening, jazz lovers!");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    FinishReason, GenerationClient, GenerationError, GenerationRequest, GenerationResponse,
    ProviderInfo, TokenUsage,
};

/// Most recent calls kept for inspection; older ones are dropped.
pub const MAX_RECORDED_CALLS: usize = 64;

/// Mock generation client.
///
/// Configurable to return specific drafts, simulate delays, or inject errors.
#[derive(Debug, Clone)]
pub struct MockGenerationClient {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Most recent calls, oldest first.
    calls: Arc<Mutex<VecDeque<GenerationRequest>>>,
    /// Calls made since creation or the last `clear_calls`.
    total_calls: Arc<AtomicUsize>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success {
        content: String,
        usage: TokenUsage,
        finish_reason: FinishReason,
    },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate content filtering.
    ContentFiltered { reason: String },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate a response with no text.
    EmptyResponse,
    /// Simulate provider-side timeout.
    Timeout { timeout_secs: u64 },
}

impl From<MockError> for GenerationError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => {
                GenerationError::rate_limited(retry_after_secs)
            }
            MockError::ContentFiltered { reason } => GenerationError::content_filtered(reason),
            MockError::Unavailable { message } => GenerationError::unavailable(message),
            MockError::AuthenticationFailed => GenerationError::AuthenticationFailed,
            MockError::Network { message } => GenerationError::network(message),
            MockError::EmptyResponse => GenerationError::EmptyResponse,
            MockError::Timeout { timeout_secs } => GenerationError::timeout(timeout_secs),
        }
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationClient {
    /// Creates a new mock client with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(VecDeque::new())),
            total_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.with_response_full(content, TokenUsage::new(10, 20), FinishReason::Stop)
    }

    /// Adds a successful response with full configuration.
    pub fn with_response_full(
        self,
        content: impl Into<String>,
        usage: TokenUsage,
        finish_reason: FinishReason,
    ) -> Self {
        lock(&self.responses).push_back(MockResponse::Success {
            content: content.into(),
            usage,
            finish_reason,
        });
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of calls made to this client.
    pub fn call_count(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Returns the recorded calls, at most [`MAX_RECORDED_CALLS`] of them.
    pub fn get_calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).iter().cloned().collect()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
        self.total_calls.store(0, Ordering::SeqCst);
    }

    fn record_call(&self, request: GenerationRequest) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let mut calls = lock(&self.calls);
        if calls.len() == MAX_RECORDED_CALLS {
            calls.pop_front();
        }
        calls.push_back(request);
    }

    /// Gets the next queued response, or echoes the brief.
    fn next_response(&self, request: &GenerationRequest) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: format!(
                    "[mock draft]\n{}",
                    request.last_user_message().unwrap_or("(no brief)")
                ),
                usage: TokenUsage::new(5, 10),
                finish_reason: FinishReason::Stop,
            })
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let response = self.next_response(&request);
        self.record_call(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match response {
            MockResponse::Success {
                content,
                usage,
                finish_reason,
            } => Ok(GenerationResponse {
                content,
                model: self.info.model.clone(),
                usage,
                finish_reason,
            }),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
