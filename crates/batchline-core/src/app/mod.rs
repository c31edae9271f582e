//! App - readers built on the ports.
//!
//! # Main components
//! - **DelegatingItemReader**: forwards to one inner reader, checks it is set
//! - **CountingItemReader**: restartable reader over any `ItemSource`

pub mod counting;
pub mod delegating;

pub use self::counting::{CountingItemReader, READ_COUNT, READ_COUNT_MAX};
pub use self::delegating::{
    DelegatingItemReader, DelegatingItemReaderBuilder, SharedReader, shared,
};
