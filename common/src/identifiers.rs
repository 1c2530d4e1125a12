use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const PEER_ID_LEN: usize = 8;
const PEER_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Identifies one process on a shared channel, so a peer can tell its own
/// broadcast echoes apart from the opponent's messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..PEER_ID_LEN)
            .map(|_| PEER_ID_ALPHABET[rng.random_range(0..PEER_ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
