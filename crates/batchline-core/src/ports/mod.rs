//! Ports: the traits orchestration and assembly code program against.

pub mod item_reader;
pub mod item_source;
pub mod validate;

pub use self::item_reader::{ItemReader, ItemStream, ItemStreamReader};
pub use self::item_source::ItemSource;
pub use self::validate::Validate;
