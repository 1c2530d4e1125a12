use std::fmt;
use tokio::time::{Duration, timeout};

use crate::game::{GameState, Mark};
use crate::identifiers::PeerId;
use crate::log;
use crate::messages::{Envelope, Message};
use crate::room_code::RoomCode;
use crate::transport::{Transport, TransportChannel};

use super::SessionPhase;
use super::events::SessionEvent;

pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub enum JoinError {
    InvalidCode(String),
    Timeout,
    ConnectionFailed(String),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::InvalidCode(reason) => write!(f, "{}", reason),
            JoinError::Timeout => write!(f, "Invalid or expired room code. Please try again."),
            JoinError::ConnectionFailed(reason) => write!(f, "Connection failed: {}", reason),
        }
    }
}

/// Starts hosting: picks a room code and opens its channel. The returned
/// session sits in the `Hosting` phase until a peer shows up.
pub async fn host<T: Transport>(transport: &T) -> Result<HostedSession<T::Channel>, String> {
    let room = RoomCode::generate();
    let channel = transport.open(&room.channel_key()).await?;

    Ok(HostedSession {
        room,
        local_id: PeerId::generate(),
        channel,
    })
}

/// Joins a hosted room. The wait for the host's answer is bounded by
/// `join_timeout`; when it elapses the channel is closed and the caller is
/// back in `Idle`, free to retry on a fresh channel.
pub async fn join<T: Transport>(
    transport: &T,
    raw_code: &str,
    join_timeout: Duration,
) -> Result<GameSession<T::Channel>, JoinError> {
    let room = RoomCode::parse(raw_code).map_err(JoinError::InvalidCode)?;
    let mut channel = transport
        .open(&room.channel_key())
        .await
        .map_err(JoinError::ConnectionFailed)?;
    let local_id = PeerId::generate();

    channel
        .send(Envelope::new(local_id.clone(), Message::JoinRequest))
        .await;

    match timeout(join_timeout, wait_for_accept(&mut channel, &local_id)).await {
        Ok(true) => Ok(GameSession::paired(room, local_id, Mark::O, channel)),
        Ok(false) => {
            channel.close().await;
            Err(JoinError::ConnectionFailed(
                "Channel closed while joining".to_string(),
            ))
        }
        Err(_) => {
            channel.close().await;
            Err(JoinError::Timeout)
        }
    }
}

async fn wait_for_accept<C: TransportChannel>(channel: &mut C, local_id: &PeerId) -> bool {
    loop {
        let Some(envelope) = channel.recv().await else {
            return false;
        };
        // The bus echoes our own join_request back to us.
        if envelope.sender == *local_id {
            continue;
        }
        if envelope.message == Message::JoinAccepted {
            return true;
        }
    }
}

/// A session waiting for its peer: the room code is on screen, the channel
/// is open, nobody has joined yet.
pub struct HostedSession<C: TransportChannel> {
    room: RoomCode,
    local_id: PeerId,
    channel: C,
}

impl<C: TransportChannel> HostedSession<C> {
    pub fn room_code(&self) -> &RoomCode {
        &self.room
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::Hosting
    }

    /// Blocks until a join request arrives from another peer, accepts it and
    /// pairs up with the local side as X. Callers that want to abandon
    /// hosting race this against user input and drop the future.
    pub async fn wait_for_peer(mut self) -> Result<GameSession<C>, String> {
        loop {
            let Some(envelope) = self.channel.recv().await else {
                return Err("Channel closed while waiting for an opponent".to_string());
            };
            if envelope.sender == self.local_id {
                continue;
            }
            match envelope.message {
                Message::JoinRequest => {
                    self.channel
                        .send(Envelope::new(self.local_id.clone(), Message::JoinAccepted))
                        .await;
                    return Ok(GameSession::paired(
                        self.room,
                        self.local_id,
                        Mark::X,
                        self.channel,
                    ));
                }
                // Nothing else is meaningful before pairing.
                _ => continue,
            }
        }
    }

    pub async fn cancel(self) {
        self.channel.close().await;
    }
}

/// A paired two-player session: both sides completed the handshake and now
/// exchange in-game messages. The board copy here is local; consistency
/// with the peer comes only from applying the same deltas.
pub struct GameSession<C: TransportChannel> {
    room: RoomCode,
    local_id: PeerId,
    local_mark: Mark,
    game: GameState,
    channel: C,
}

impl<C: TransportChannel> GameSession<C> {
    fn paired(room: RoomCode, local_id: PeerId, local_mark: Mark, channel: C) -> Self {
        Self {
            room,
            local_id,
            local_mark,
            game: GameState::new(),
            channel,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::Paired
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room
    }

    pub fn local_mark(&self) -> Mark {
        self.local_mark
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn is_local_turn(&self) -> bool {
        self.game.is_active() && self.game.current_turn() == self.local_mark
    }

    /// Plays a move for the local side and announces it. Checked against
    /// local state before anything is transmitted; this is a courtesy check,
    /// not a security boundary.
    pub async fn play_local(&mut self, index: usize) -> Result<(), String> {
        if !self.is_local_turn() {
            return Err("Not your turn".to_string());
        }
        self.game.play_move(index)?;
        self.channel
            .send(Envelope::new(self.local_id.clone(), Message::Move { index }))
            .await;
        Ok(())
    }

    /// Starts a new round and tells the peer to do the same.
    pub async fn restart(&mut self) {
        self.game.reset();
        self.channel
            .send(Envelope::new(self.local_id.clone(), Message::Restart))
            .await;
    }

    /// Announces departure and releases the channel.
    pub async fn leave(mut self) {
        self.channel
            .send(Envelope::new(self.local_id.clone(), Message::Leave))
            .await;
        self.channel.close().await;
    }

    /// Tears the session down without announcing anything, for when the peer
    /// already left or the medium is gone.
    pub async fn close(self) {
        self.channel.close().await;
    }

    /// Waits for the next meaningful peer message and applies it. Own
    /// echoes, stray handshake messages and illegal moves are dropped here
    /// so the caller only ever sees state that actually changed.
    pub async fn next_event(&mut self) -> SessionEvent {
        loop {
            let Some(envelope) = self.channel.recv().await else {
                return SessionEvent::ConnectionLost;
            };
            if envelope.sender == self.local_id {
                continue;
            }
            match envelope.message {
                Message::Move { index } => match self.game.play_move(index) {
                    Ok(()) => return SessionEvent::PeerMoved { index },
                    Err(reason) => {
                        log!("[room:{}] Ignoring peer move {}: {}", self.room, index, reason);
                        continue;
                    }
                },
                Message::Restart => {
                    self.game.reset();
                    return SessionEvent::PeerRestarted;
                }
                Message::Leave => return SessionEvent::PeerLeft,
                Message::JoinRequest | Message::JoinAccepted => continue,
            }
        }
    }
}
