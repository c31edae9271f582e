//! DelegatingItemReader - forwards every reader call to one inner reader.
//!
//! The only behaviour it adds on top of the inner reader is the
//! missing-delegate check and lifecycle bookkeeping. Items, exhaustion and
//! errors come back exactly as the inner reader produced them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ExecutionContext, ReaderError, StreamState};
use crate::ports::{ItemReader, ItemStream, ItemStreamReader, Validate};

/// Shared handle to an inner reader.
///
/// The delegate does not own the inner reader exclusively: assembly code or a
/// test harness may keep its own clone of the handle. The lock is held for one
/// forwarded call at a time.
pub type SharedReader<R> = Arc<Mutex<R>>;

/// Wrap a reader in a `SharedReader` handle.
pub fn shared<R>(reader: R) -> SharedReader<R> {
    Arc::new(Mutex::new(reader))
}

/// DelegatingItemReader wraps exactly one inner reader.
///
/// # Usage
/// ```ignore
/// let inner = shared(my_reader);
/// let mut reader = DelegatingItemReader::new();
/// reader.set_delegate(inner.clone())?;
/// reader.validate()?;
/// reader.open(&mut ctx).await?;
/// while let Some(item) = reader.read().await? { ... }
/// reader.close(&mut ctx).await?;
/// ```
///
/// # Lifecycle
/// - no delegate: `Unconfigured`; `read` / `update` / `close` are usage errors
///   and `validate` / `open` report the missing collaborator
/// - delegate assigned: `Unopened`; `read` is already forwarded
/// - after `open`: `Open`
/// - after `close`: `Closed`; nothing is forwarded any more
///
/// The delegate can be assigned once. There is no rebinding.
pub struct DelegatingItemReader<R> {
    delegate: Option<SharedReader<R>>,
    lifecycle: StreamState,
}

impl<R> DelegatingItemReader<R> {
    /// Create a reader with no delegate.
    pub fn new() -> Self {
        Self {
            delegate: None,
            lifecycle: StreamState::Unopened,
        }
    }

    /// Create a reader already bound to `delegate`.
    pub fn with_delegate(delegate: SharedReader<R>) -> Self {
        Self {
            delegate: Some(delegate),
            lifecycle: StreamState::Unopened,
        }
    }

    pub fn builder() -> DelegatingItemReaderBuilder<R> {
        DelegatingItemReaderBuilder::new()
    }

    /// Bind the inner reader. Fails if one is already bound.
    pub fn set_delegate(&mut self, delegate: SharedReader<R>) -> Result<(), ReaderError> {
        if self.delegate.is_some() {
            return Err(ReaderError::DelegateAlreadySet);
        }
        self.delegate = Some(delegate);
        Ok(())
    }

    pub fn delegate(&self) -> Option<&SharedReader<R>> {
        self.delegate.as_ref()
    }

    pub fn state(&self) -> StreamState {
        if self.delegate.is_none() {
            StreamState::Unconfigured
        } else {
            self.lifecycle
        }
    }

    fn require_delegate(&self) -> Result<&SharedReader<R>, ReaderError> {
        self.delegate.as_ref().ok_or(ReaderError::MissingCollaborator {
            component: "DelegatingItemReader",
            collaborator: "delegate",
        })
    }

    /// Delegate handle for a call that is only legal in `allowed` states.
    fn guard(
        &self,
        operation: &'static str,
        allowed: fn(StreamState) -> bool,
    ) -> Result<SharedReader<R>, ReaderError> {
        let state = self.state();
        if !allowed(state) {
            return Err(ReaderError::illegal_state(operation, state));
        }
        self.require_delegate().cloned()
    }
}

impl<R> Default for DelegatingItemReader<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Validate for DelegatingItemReader<R> {
    fn validate(&self) -> Result<(), ReaderError> {
        self.require_delegate().map(|_| ())
    }
}

#[async_trait]
impl<R: ItemStreamReader> ItemReader for DelegatingItemReader<R> {
    type Item = R::Item;

    async fn read(&mut self) -> Result<Option<R::Item>, ReaderError> {
        let delegate = self.guard("read", StreamState::can_read)?;
        tracing::trace!("forwarding read");
        let mut inner = delegate.lock().await;
        inner.read().await
    }

    async fn mark(&mut self) -> Result<(), ReaderError> {
        let delegate = self.guard("mark", StreamState::can_read)?;
        let mut inner = delegate.lock().await;
        inner.mark().await
    }

    async fn reset(&mut self) -> Result<(), ReaderError> {
        let delegate = self.guard("reset", StreamState::can_read)?;
        let mut inner = delegate.lock().await;
        inner.reset().await
    }
}

#[async_trait]
impl<R: ItemStreamReader> ItemStream for DelegatingItemReader<R> {
    async fn open(&mut self, ctx: &mut ExecutionContext) -> Result<(), ReaderError> {
        if self.state().is_terminal() {
            return Err(ReaderError::illegal_state("open", StreamState::Closed));
        }
        self.validate()?;
        let delegate = self.require_delegate()?.clone();
        delegate.lock().await.open(ctx).await?;
        self.lifecycle = StreamState::Open;
        tracing::debug!(keys = ctx.len(), "delegating reader opened");
        Ok(())
    }

    async fn update(&mut self, ctx: &mut ExecutionContext) -> Result<(), ReaderError> {
        let delegate = self.guard("update", |s| s == StreamState::Open)?;
        let mut inner = delegate.lock().await;
        inner.update(ctx).await
    }

    async fn close(&mut self, ctx: &mut ExecutionContext) -> Result<(), ReaderError> {
        let delegate = self.guard("close", StreamState::can_read)?;
        delegate.lock().await.close(ctx).await?;
        self.lifecycle = StreamState::Closed;
        tracing::debug!("delegating reader closed");
        Ok(())
    }
}

/// Fail-fast assembly for `DelegatingItemReader`.
///
/// `build()` runs `validate`, so a reader that leaves the builder is always
/// configured.
pub struct DelegatingItemReaderBuilder<R> {
    delegate: Option<SharedReader<R>>,
}

impl<R> DelegatingItemReaderBuilder<R> {
    pub fn new() -> Self {
        Self { delegate: None }
    }

    pub fn delegate(mut self, delegate: SharedReader<R>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn build(self) -> Result<DelegatingItemReader<R>, ReaderError> {
        let reader = DelegatingItemReader {
            delegate: self.delegate,
            lifecycle: StreamState::Unopened,
        };
        reader.validate()?;
        Ok(reader)
    }
}

impl<R> Default for DelegatingItemReaderBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}
