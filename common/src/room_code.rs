use rand::Rng;
use std::fmt;

pub const ROOM_CODE_LEN: usize = 5;
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CHANNEL_PREFIX: &str = "tictactoe-";

/// Short shareable token identifying a session's channel. There is no global
/// uniqueness registry; two hosts picking the same code is an accepted
/// tradeoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalizes user input: codes are matched case-insensitively.
    pub fn parse(input: &str) -> Result<Self, String> {
        let code = input.trim().to_uppercase();
        if code.len() != ROOM_CODE_LEN {
            return Err(format!("Room code must be {} characters", ROOM_CODE_LEN));
        }
        if !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
            return Err("Room code must be letters and digits only".to_string());
        }
        Ok(Self(code))
    }

    pub fn channel_key(&self) -> ChannelKey {
        ChannelKey::new(format!("{}{}", CHANNEL_PREFIX, self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Topic address derived from a room code, namespaced so unrelated traffic
/// on the same medium never collides with a game channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey(String);

impl ChannelKey {
    pub fn new(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
