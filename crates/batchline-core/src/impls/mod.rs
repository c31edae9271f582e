//! Impls - concrete sources shipped with the core.
//!
//! # Included
//! - **ListItemSource**: in-memory list, random access

pub mod list_source;

pub use self::list_source::ListItemSource;
