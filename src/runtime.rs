//! Runtime abstraction layer for async operations
//!
//! The compositor never blocks on the network: every tile download is a future
//! handed to an [`AsyncSpawner`]. Which executor drives those futures is up to the
//! host. Tokio is the default; [`DeferredSpawner`] lets a single-threaded host (or
//! a test) decide exactly when each download makes progress.

use std::collections::VecDeque;

use futures::future::BoxFuture;

use crate::prelude::{Arc, Mutex};

/// A trait for spawning detached async tasks (object safe)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Start driving `future` to completion. Its output is delivered through
    /// whatever channel the future itself captured.
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>);
}

#[cfg(feature = "tokio-runtime")]
pub use tokio_impl::TokioSpawner;

#[cfg(feature = "tokio-runtime")]
mod tokio_impl {
    use super::*;
    use crate::{CompositorError, Result};

    /// Tokio-based async spawner
    #[derive(Debug, Clone)]
    pub struct TokioSpawner {
        handle: ::tokio::runtime::Handle,
    }

    impl TokioSpawner {
        pub fn new(handle: ::tokio::runtime::Handle) -> Self {
            Self { handle }
        }

        /// Spawner bound to the runtime the caller is running in
        pub fn current() -> Result<Self> {
            ::tokio::runtime::Handle::try_current()
                .map(Self::new)
                .map_err(|e| CompositorError::Runtime(e.to_string()))
        }
    }

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: BoxFuture<'static, ()>) {
            // Detached: results travel over the compositor's completion channel
            drop(self.handle.spawn(future));
        }
    }
}

/// Spawner that only queues futures; the owner runs them explicitly.
///
/// Each queued future is run to completion on the calling thread by
/// [`run_next`](Self::run_next) or [`run_all`](Self::run_all), which makes the
/// number of in-flight downloads and their completion order fully deterministic.
#[derive(Clone, Default)]
pub struct DeferredSpawner {
    tasks: Arc<Mutex<VecDeque<BoxFuture<'static, ()>>>>,
}

impl DeferredSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of spawned futures that have not been run yet
    pub fn pending(&self) -> usize {
        self.tasks.lock().map(|tasks| tasks.len()).unwrap_or(0)
    }

    /// Run the oldest pending future to completion. Returns `false` when there was none.
    pub fn run_next(&self) -> bool {
        // Release the lock before running so the future may spawn more work
        let next = match self.tasks.lock() {
            Ok(mut tasks) => tasks.pop_front(),
            Err(_) => None,
        };

        match next {
            Some(future) => {
                futures::executor::block_on(future);
                true
            }
            None => false,
        }
    }

    /// Run pending futures until none are left, returning how many ran
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl std::fmt::Debug for DeferredSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredSpawner")
            .field("pending", &self.pending())
            .finish()
    }
}

impl AsyncSpawner for DeferredSpawner {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push_back(future);
        }
    }
}
