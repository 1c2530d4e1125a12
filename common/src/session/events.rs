/// What a paired session reports back to the presentation layer after
/// demultiplexing the peer's messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The peer's move was applied to the local board.
    PeerMoved { index: usize },
    /// The peer started a new round; the local board was reset.
    PeerRestarted,
    /// The peer left. The session is over; tear it down.
    PeerLeft,
    /// The underlying medium is gone. The session is over; tear it down.
    ConnectionLost,
}
