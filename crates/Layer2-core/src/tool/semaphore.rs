//! Execution semaphore
//!
//! A thin wrapper over the runtime's counting semaphore that pins the one
//! supported usage pattern: run a future while holding a permit, releasing
//! it on every exit path. Waiters are woken in FIFO order.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Counting semaphore bounding concurrently running executor calls
#[derive(Debug, Clone)]
pub struct ExecutionSemaphore {
    inner: Arc<Semaphore>,
}

impl ExecutionSemaphore {
    /// Create a semaphore with `permits` slots (minimum 1)
    pub fn new(permits: usize) -> Self {
        Self {
            inner: Arc::new(Semaphore::new(permits.max(1))),
        }
    }

    /// Permits not currently held
    pub fn available_permits(&self) -> usize {
        self.inner.available_permits()
    }

    /// Run `fut` while holding one permit
    ///
    /// The permit is released when the future completes, errors, or the
    /// task is torn down; it is an RAII guard, not a manual pair.
    pub async fn with_permit<T>(&self, fut: impl Future<Output = T>) -> T {
        // The semaphore is never closed, so acquire cannot fail here
        let _permit = self.inner.acquire().await.expect("semaphore closed");
        fut.await
    }
}
