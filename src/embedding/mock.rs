use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::backend::{EmbeddingBackend, StubEmbeddingBackend};
use super::error::EmbeddingError;

/// Instrumented backend for tests: counts calls, records inputs, can be told to fail.
pub struct MockEmbeddingBackend {
    inner: StubEmbeddingBackend,
    calls: AtomicUsize,
    per_text: Mutex<HashMap<String, usize>>,
    failing: AtomicBool,
    fail_after_calls: Mutex<Option<usize>>,
}

impl MockEmbeddingBackend {
    pub fn new(dim: usize) -> Self {
        Self {
            inner: StubEmbeddingBackend::new(dim.max(1)).expect("dimension is non-zero"),
            calls: AtomicUsize::new(0),
            per_text: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            fail_after_calls: Mutex::new(None),
        }
    }

    /// Number of `embed` invocations so far (including failed ones).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// How many times `text` was sent to the backend.
    pub fn times_embedded(&self, text: &str) -> usize {
        self.per_text.lock().get(text).copied().unwrap_or(0)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Succeed for the next `calls` invocations, then fail.
    pub fn fail_after(&self, calls: usize) {
        *self.fail_after_calls.lock() = Some(self.call_count() + calls);
    }
}

impl EmbeddingBackend for MockEmbeddingBackend {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let call_index = self.calls.fetch_add(1, Ordering::SeqCst);

        let tripped = self
            .fail_after_calls
            .lock()
            .is_some_and(|limit| call_index >= limit);
        if self.failing.load(Ordering::SeqCst) || tripped {
            return Err(EmbeddingError::backend(self.name(), "injected failure"));
        }

        {
            let mut seen = self.per_text.lock();
            for text in texts {
                *seen.entry(text.clone()).or_default() += 1;
            }
        }

        self.inner.embed(texts)
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
