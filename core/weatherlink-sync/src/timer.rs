//! One-shot delayed task facility provided by the host runtime.

use crate::error::{SyncError, SyncResult};
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::runtime::Handle;

/// Runs a task once after a delay. Repeating work re-arms itself.
pub trait TaskScheduler: Send + Sync {
    fn schedule_after(&self, delay: Duration, task: BoxFuture<'static, ()>);
}

/// Timer backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: Handle,
}

impl TokioTimer {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running on.
    pub fn current() -> SyncResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| SyncError::Config(format!("no tokio runtime: {e}")))
    }
}

impl TaskScheduler for TokioTimer {
    fn schedule_after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }
}

/// A manually driven timer for testing.
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Queues scheduled tasks until the test runs them.
    #[derive(Default)]
    pub struct ManualTimer {
        pending: Mutex<VecDeque<(Duration, BoxFuture<'static, ()>)>>,
    }

    impl ManualTimer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of armed tasks.
        pub fn pending(&self) -> usize {
            self.pending.lock().unwrap().len()
        }

        /// Delays of the armed tasks, oldest first.
        pub fn delays(&self) -> Vec<Duration> {
            self.pending.lock().unwrap().iter().map(|(d, _)| *d).collect()
        }

        /// Removes the oldest armed task without running it.
        pub fn take_next(&self) -> Option<BoxFuture<'static, ()>> {
            self.pending.lock().unwrap().pop_front().map(|(_, task)| task)
        }

        /// Runs the oldest armed task. Returns `false` if none was armed.
        pub async fn fire_next(&self) -> bool {
            let task = self.take_next();
            match task {
                Some(task) => {
                    task.await;
                    true
                }
                None => false,
            }
        }
    }

    impl std::fmt::Debug for ManualTimer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ManualTimer")
                .field("delays", &self.delays())
                .finish()
        }
    }

    impl TaskScheduler for ManualTimer {
        fn schedule_after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
            self.pending.lock().unwrap().push_back((delay, task));
        }
    }
}
