//! Component-scoped context keys.

use std::fmt;

/// KeyNamespace prefixes context keys with the owning component's name so that
/// several readers can share one `ExecutionContext` without collisions.
///
/// ```
/// use batchline_core::domain::KeyNamespace;
///
/// let ns = KeyNamespace::new("customers");
/// assert_eq!(ns.key("read.count"), "customers.read.count");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyNamespace(String);

impl KeyNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn key(&self, suffix: &str) -> String {
        format!("{}.{}", self.0, suffix)
    }
}

impl fmt::Display for KeyNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
