//! batchline-core
//!
//! Restartable item readers for batch pipelines.
//!
//! # Modules
//! - **domain**: `ExecutionContext` (checkpoint store), key namespaces, lifecycle state, errors
//! - **ports**: `ItemReader`, `ItemStream`, `ItemSource`, `Validate`
//! - **app**: `DelegatingItemReader`, `CountingItemReader`
//! - **impls**: `ListItemSource`

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{CountingItemReader, DelegatingItemReader, SharedReader, shared};
pub use domain::{ContextValue, ErrorKind, ExecutionContext, KeyNamespace, ReaderError, StreamState};
pub use ports::{ItemReader, ItemSource, ItemStream, ItemStreamReader, Validate};
