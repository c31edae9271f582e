//! The restartable reader contract.
//!
//! Orchestration drives a reader like this:
//!
//! ```text
//! open(ctx) -> read()* -> update(ctx) -> read()* -> update(ctx) ... -> close(ctx)
//! ```
//!
//! `read` returns `Ok(None)` once the stream is exhausted; that is normal
//! termination, not an error.

use async_trait::async_trait;

use crate::domain::{ExecutionContext, ReaderError};

/// ItemReader produces items one at a time.
///
/// # Contract
/// - `read` advances the reader's position and never touches the execution context.
/// - `mark` / `reset` are optional rollback primitives. They default to no-ops for
///   readers whose position is already captured by `update` / `open`.
#[async_trait]
pub trait ItemReader: Send {
    type Item: Send;

    async fn read(&mut self) -> Result<Option<Self::Item>, ReaderError>;

    /// Record the current position as the rollback point.
    async fn mark(&mut self) -> Result<(), ReaderError> {
        Ok(())
    }

    /// Rewind to the last `mark`.
    async fn reset(&mut self) -> Result<(), ReaderError> {
        Ok(())
    }
}

/// ItemStream moves position state in and out of an `ExecutionContext`.
///
/// # Contract
/// - `open`: restore position from the keys this component owns, or start from
///   the beginning when they are absent. Calling it twice with the same context
///   lands on the same position.
/// - `update`: write every key a later `open` needs, and remove the ones it no
///   longer needs. Nothing stale may remain.
/// - `close`: release held resources.
#[async_trait]
pub trait ItemStream: Send {
    async fn open(&mut self, ctx: &mut ExecutionContext) -> Result<(), ReaderError>;

    async fn update(&mut self, ctx: &mut ExecutionContext) -> Result<(), ReaderError>;

    async fn close(&mut self, ctx: &mut ExecutionContext) -> Result<(), ReaderError>;
}

/// A reader that can be checkpointed and restarted.
pub trait ItemStreamReader: ItemReader + ItemStream {}

impl<T: ItemReader + ItemStream + ?Sized> ItemStreamReader for T {}
