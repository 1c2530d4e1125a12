mod events;
mod game_session;

pub use events::SessionEvent;
pub use game_session::{DEFAULT_JOIN_TIMEOUT, GameSession, HostedSession, JoinError, host, join};

/// Protocol-level state, distinct from the board state. `Idle` is the state
/// with no session value alive; the other phases are carried by
/// `HostedSession` and `GameSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Hosting,
    Joining,
    Paired,
}
