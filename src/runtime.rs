//! Runtime abstraction layer for async operations
//!
//! The map never owns an executor. Fetch tasks are handed to an
//! [`AsyncSpawner`] supplied by the host, so the same map works on Tokio, on
//! a custom executor, or fully inline in tests.

use futures::future::BoxFuture;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and forget about it.
    ///
    /// There is no handle: spawned fetches are cancelled cooperatively through
    /// their validity flag, never aborted.
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>);
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    /// Runs every future to completion on the calling thread.
    ///
    /// Deterministic, which makes it the spawner of choice for tests and for
    /// hosts without an async runtime. Blocking I/O inside the future blocks
    /// the caller.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct InlineSpawner;

    impl AsyncSpawner for InlineSpawner {
        fn spawn_boxed(&self, future: BoxFuture<'static, ()>) {
            futures::executor::block_on(future);
        }
    }

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::runtime::Handle;

        /// Tokio-based async spawner
        #[derive(Debug, Clone)]
        pub struct TokioSpawner {
            handle: Handle,
        }

        impl TokioSpawner {
            pub fn new(handle: Handle) -> Self {
                Self { handle }
            }

            /// Spawner bound to the runtime of the calling context.
            ///
            /// Returns `None` outside of a Tokio runtime.
            pub fn current() -> Option<Self> {
                Handle::try_current().ok().map(Self::new)
            }
        }

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, future: BoxFuture<'static, ()>) {
                // The JoinHandle is dropped; the task keeps running detached
                let _ = self.handle.spawn(future);
            }
        }
    }
}
