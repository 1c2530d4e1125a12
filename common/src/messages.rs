use serde::{Deserialize, Serialize};

use crate::identifiers::PeerId;

/// The whole in-session vocabulary. Anything that does not parse into one of
/// these variants is dropped by the receiver instead of failing the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    JoinRequest,
    JoinAccepted,
    Move { index: usize },
    Restart,
    Leave,
}

/// One wire record: the message plus the sender's peer id, which receivers
/// use to drop their own broadcast echoes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    pub sender: PeerId,
    #[serde(flatten)]
    pub message: Message,
}

impl Envelope {
    pub fn new(sender: PeerId, message: Message) -> Self {
        Self { sender, message }
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Failed to encode envelope: {}", e))
    }

    pub fn from_json(payload: &str) -> Result<Self, String> {
        serde_json::from_str(payload).map_err(|e| format!("Failed to decode envelope: {}", e))
    }
}
