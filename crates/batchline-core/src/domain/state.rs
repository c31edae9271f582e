//! Reader lifecycle state.

/// StreamState tracks where a reader is in its lifecycle.
///
/// State transitions:
/// - Unconfigured -> Unopened (mandatory collaborator assigned)
/// - Unopened -> Open (open)
/// - Open -> Open (read / update / open again)
/// - Unopened | Open -> Closed (close)
///
/// Closed is terminal: a closed reader is dropped and a fresh one is built on restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Mandatory collaborator not assigned yet.
    Unconfigured,

    /// Configured, `open` not called yet.
    Unopened,

    /// Reading.
    Open,

    /// Closed; no further calls are accepted.
    Closed,
}

impl StreamState {
    /// Is `read` accepted in this state?
    pub fn can_read(self) -> bool {
        matches!(self, StreamState::Unopened | StreamState::Open)
    }

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Closed)
    }
}
