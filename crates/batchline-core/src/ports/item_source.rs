//! ItemSource port - the raw data a `CountingItemReader` pulls from.

use async_trait::async_trait;

use crate::domain::ReaderError;

/// ItemSource is the part of a reader that knows how to fetch data.
///
/// Counting, checkpoint keys and restart live in `CountingItemReader`; a source
/// only opens, reads, closes, and optionally skips ahead.
#[async_trait]
pub trait ItemSource: Send {
    type Item: Send;

    /// Acquire resources and position at the first item.
    async fn do_open(&mut self) -> Result<(), ReaderError>;

    async fn do_read(&mut self) -> Result<Option<Self::Item>, ReaderError>;

    /// Release resources.
    async fn do_close(&mut self) -> Result<(), ReaderError>;

    /// Move past the first `item_index` items after `do_open`.
    ///
    /// The default reads and discards. Sources with random access should
    /// override it.
    async fn jump_to_item(&mut self, item_index: i64) -> Result<(), ReaderError> {
        for _ in 0..item_index {
            if self.do_read().await?.is_none() {
                break;
            }
        }
        Ok(())
    }
}
