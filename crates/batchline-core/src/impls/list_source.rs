//! ListItemSource - in-memory source for tests and demos.

use async_trait::async_trait;

use crate::domain::ReaderError;
use crate::ports::ItemSource;

/// ListItemSource hands out clones of a fixed list.
///
/// Random access: `jump_to_item` moves the cursor without reading.
#[derive(Debug, Clone)]
pub struct ListItemSource<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> ListItemSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<T: Clone + Send> ItemSource for ListItemSource<T> {
    type Item = T;

    async fn do_open(&mut self) -> Result<(), ReaderError> {
        self.cursor = 0;
        Ok(())
    }

    async fn do_read(&mut self) -> Result<Option<T>, ReaderError> {
        let item = self.items.get(self.cursor).cloned();
        if item.is_some() {
            self.cursor += 1;
        }
        Ok(item)
    }

    async fn do_close(&mut self) -> Result<(), ReaderError> {
        Ok(())
    }

    async fn jump_to_item(&mut self, item_index: i64) -> Result<(), ReaderError> {
        let index = usize::try_from(item_index).unwrap_or(0);
        self.cursor = index.min(self.items.len());
        Ok(())
    }
}
