//! CountingItemReader - restartable reader on top of any `ItemSource`.
//!
//! Position is the number of items handed out so far. `update` stores it under
//! `{name}.read.count`; `open` reads it back and asks the source to skip that
//! many items.

use async_trait::async_trait;

use crate::domain::{ExecutionContext, KeyNamespace, ReaderError, StreamState};
use crate::ports::{ItemReader, ItemSource, ItemStream, Validate};

/// Context key suffix for the number of items read.
pub const READ_COUNT: &str = "read.count";

/// Context key suffix for the item limit, present only when a limit is set.
pub const READ_COUNT_MAX: &str = "read.count.max";

/// CountingItemReader turns an `ItemSource` into a restartable reader.
///
/// # Configuration
/// - `with_name`: key namespace; required while `save_state` is on
/// - `with_max_item_count`: stop after this many items (default: unlimited)
/// - `with_start_index`: skip this many items on a fresh start
/// - `with_save_state(false)`: never touch the execution context
///
/// # Restart
/// ```ignore
/// let mut reader = CountingItemReader::new(source).with_name("orders");
/// reader.open(&mut ctx).await?;  // resumes at ctx["orders.read.count"]
/// ```
pub struct CountingItemReader<S> {
    source: S,
    namespace: Option<KeyNamespace>,
    save_state: bool,
    start_index: i64,
    configured_max: i64,

    /// Effective limit; a restored `read.count.max` overrides `configured_max`.
    max_item_count: i64,
    current_item_count: i64,
    marked_count: i64,
    state: StreamState,
}

impl<S: ItemSource> CountingItemReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            namespace: None,
            save_state: true,
            start_index: 0,
            configured_max: i64::MAX,
            max_item_count: i64::MAX,
            current_item_count: 0,
            marked_count: 0,
            state: StreamState::Unopened,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.namespace = Some(KeyNamespace::new(name));
        self
    }

    pub fn with_max_item_count(mut self, max_item_count: i64) -> Self {
        self.configured_max = max_item_count;
        self.max_item_count = max_item_count;
        self
    }

    pub fn with_start_index(mut self, start_index: i64) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn with_save_state(mut self, save_state: bool) -> Self {
        self.save_state = save_state;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.namespace.as_ref().map(KeyNamespace::name)
    }

    pub fn current_item_count(&self) -> i64 {
        self.current_item_count
    }

    pub fn max_item_count(&self) -> i64 {
        self.max_item_count
    }

    /// Lifecycle state. An unopened reader whose configuration would fail
    /// `validate` reports `Unconfigured`.
    pub fn state(&self) -> StreamState {
        if self.state == StreamState::Unopened && self.validate().is_err() {
            StreamState::Unconfigured
        } else {
            self.state
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn require_state(
        &self,
        operation: &'static str,
        allowed: fn(StreamState) -> bool,
    ) -> Result<(), ReaderError> {
        let state = self.state();
        if allowed(state) {
            Ok(())
        } else {
            Err(ReaderError::illegal_state(operation, state))
        }
    }

    /// Namespace for checkpoint keys, or `None` when state saving is off.
    fn checkpoint_namespace(&self) -> Result<Option<&KeyNamespace>, ReaderError> {
        if !self.save_state {
            return Ok(None);
        }
        self.namespace
            .as_ref()
            .map(Some)
            .ok_or(ReaderError::MissingCollaborator {
                component: "CountingItemReader",
                collaborator: "name",
            })
    }

    /// Position and limit `open` should resume with. Reads the context only;
    /// the reader itself is left untouched.
    fn restored_position(&self, ctx: &ExecutionContext) -> Result<(i64, i64), ReaderError> {
        let mut position = self.start_index;
        let mut max = self.configured_max;
        let Some(ns) = self.checkpoint_namespace()? else {
            return Ok((position, max));
        };

        let max_key = ns.key(READ_COUNT_MAX);
        if let Some(stored) = ctx.get_long(&max_key)? {
            if stored <= 0 {
                return Err(ReaderError::InvalidCheckpoint {
                    key: max_key,
                    reason: format!("item limit {stored} is not positive"),
                });
            }
            max = stored;
        }
        let count_key = ns.key(READ_COUNT);
        if let Some(stored) = ctx.get_long(&count_key)? {
            if stored < 0 {
                return Err(ReaderError::InvalidCheckpoint {
                    key: count_key,
                    reason: format!("item count {stored} is negative"),
                });
            }
            position = stored;
        }
        Ok((position, max))
    }
}

impl<S: ItemSource> Validate for CountingItemReader<S> {
    fn validate(&self) -> Result<(), ReaderError> {
        self.checkpoint_namespace()?;
        if self.configured_max <= 0 {
            return Err(ReaderError::InvalidConfiguration(format!(
                "max_item_count must be positive, got {}",
                self.configured_max
            )));
        }
        if self.start_index < 0 {
            return Err(ReaderError::InvalidConfiguration(format!(
                "start_index must not be negative, got {}",
                self.start_index
            )));
        }
        Ok(())
    }
}

fn is_open(state: StreamState) -> bool {
    state == StreamState::Open
}

#[async_trait]
impl<S: ItemSource> ItemReader for CountingItemReader<S> {
    type Item = S::Item;

    /// Only an open reader reads: the count is meaningful once `open` has
    /// positioned the source.
    async fn read(&mut self) -> Result<Option<S::Item>, ReaderError> {
        self.require_state("read", is_open)?;
        if self.current_item_count >= self.max_item_count {
            return Ok(None);
        }
        let item = self.source.do_read().await?;
        if item.is_some() {
            self.current_item_count += 1;
        }
        Ok(item)
    }

    async fn mark(&mut self) -> Result<(), ReaderError> {
        self.require_state("mark", is_open)?;
        self.marked_count = self.current_item_count;
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), ReaderError> {
        self.require_state("reset", is_open)?;
        self.state = StreamState::Unopened;
        self.source.do_close().await?;
        self.source.do_open().await?;
        if self.marked_count > 0 {
            self.source.jump_to_item(self.marked_count).await?;
        }
        self.current_item_count = self.marked_count;
        self.state = StreamState::Open;
        tracing::debug!(position = self.marked_count, "reader reset to mark");
        Ok(())
    }
}

#[async_trait]
impl<S: ItemSource> ItemStream for CountingItemReader<S> {
    async fn open(&mut self, ctx: &mut ExecutionContext) -> Result<(), ReaderError> {
        if self.state.is_terminal() {
            return Err(ReaderError::illegal_state("open", self.state));
        }
        self.validate()?;
        let (position, max) = self.restored_position(ctx)?;

        if self.state == StreamState::Open {
            // source and counters disagree until the reopen completes
            self.state = StreamState::Unopened;
            self.source.do_close().await?;
        }
        self.source.do_open().await?;
        if position > 0 && position < max {
            self.source.jump_to_item(position).await?;
        }
        self.current_item_count = position;
        self.max_item_count = max;
        self.marked_count = 0;
        self.state = StreamState::Open;
        tracing::debug!(
            name = self.name().unwrap_or("<unnamed>"),
            position,
            max,
            "reader opened"
        );
        Ok(())
    }

    async fn update(&mut self, ctx: &mut ExecutionContext) -> Result<(), ReaderError> {
        self.require_state("update", is_open)?;
        let Some(ns) = self.checkpoint_namespace()? else {
            return Ok(());
        };
        let count_key = ns.key(READ_COUNT);
        let max_key = ns.key(READ_COUNT_MAX);

        ctx.put_long(count_key, self.current_item_count);
        if self.max_item_count < i64::MAX {
            ctx.put_long(max_key, self.max_item_count);
        } else {
            ctx.remove(&max_key);
        }
        tracing::debug!(namespace = %ns, position = self.current_item_count, "checkpoint updated");
        Ok(())
    }

    async fn close(&mut self, _ctx: &mut ExecutionContext) -> Result<(), ReaderError> {
        self.require_state("close", StreamState::can_read)?;
        self.source.do_close().await?;
        self.current_item_count = 0;
        self.marked_count = 0;
        self.state = StreamState::Closed;
        Ok(())
    }
}
