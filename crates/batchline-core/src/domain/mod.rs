//! Domain model: checkpoint store, key namespaces, lifecycle state, errors.

pub mod context;
pub mod errors;
pub mod key;
pub mod state;

pub use self::context::{ContextValue, ExecutionContext};
pub use self::errors::{ErrorKind, ReaderError};
pub use self::key::KeyNamespace;
pub use self::state::StreamState;
