//! Blocking surface over the asynchronous bindings.
//!
//! Every operation of a binding is a future. `Wait` runs one to completion
//! on the current thread, for use outside of an async context. Futures that
//! spawn tasks, such as `watch`, still need a Tokio runtime to be entered.

use std::future::Future;

/// Extension trait for blocking the current thread on a future.
pub trait Wait: Future + Sized {
    /// Blocks the current thread until the future resolves.
    fn wait(self) -> Self::Output {
        futures::executor::block_on(self)
    }
}

impl<F: Future> Wait for F {}
