use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

use crate::messages::Envelope;
use crate::room_code::ChannelKey;

use super::{Transport, TransportChannel};

const TOPIC_CAPACITY: usize = 64;

/// In-process broadcast medium: every channel opened on the same key sees
/// every envelope published to it, the publisher's own included. This is the
/// loopback analogue of the networked relay and the backend the protocol
/// tests run on.
#[derive(Clone, Default)]
pub struct LocalBus {
    topics: Arc<Mutex<HashMap<ChannelKey, broadcast::Sender<Envelope>>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn topic_count(&self) -> usize {
        self.topics.lock().await.len()
    }
}

impl Transport for LocalBus {
    type Channel = LocalChannel;

    async fn open(&self, key: &ChannelKey) -> Result<LocalChannel, String> {
        let mut topics = self.topics.lock().await;
        let sender = topics
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone();

        Ok(LocalChannel {
            key: key.clone(),
            receiver: sender.subscribe(),
            sender,
            topics: Arc::clone(&self.topics),
        })
    }
}

pub struct LocalChannel {
    key: ChannelKey,
    sender: broadcast::Sender<Envelope>,
    receiver: broadcast::Receiver<Envelope>,
    topics: Arc<Mutex<HashMap<ChannelKey, broadcast::Sender<Envelope>>>>,
}

impl TransportChannel for LocalChannel {
    async fn send(&mut self, envelope: Envelope) {
        // A topic with no other subscriber is not an error on a broadcast bus.
        let _ = self.sender.send(envelope);
    }

    async fn recv(&mut self) -> Option<Envelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn close(self) {
        let LocalChannel {
            key,
            sender,
            receiver,
            topics,
        } = self;
        drop(receiver);

        let mut topics = topics.lock().await;
        if sender.receiver_count() == 0 {
            topics.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::PeerId;
    use crate::messages::Message;

    fn key(name: &str) -> ChannelKey {
        ChannelKey::new(name.to_string())
    }

    fn envelope(sender: &str, message: Message) -> Envelope {
        Envelope::new(PeerId::new(sender.to_string()), message)
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_envelope() {
        let bus = LocalBus::new();
        let mut sender_channel = bus.open(&key("tictactoe-AAAAA")).await.unwrap();
        let mut receiver_channel = bus.open(&key("tictactoe-AAAAA")).await.unwrap();

        sender_channel
            .send(envelope("host", Message::Move { index: 4 }))
            .await;

        let received = receiver_channel.recv().await.unwrap();
        assert_eq!(received.message, Message::Move { index: 4 });
    }

    #[tokio::test]
    async fn test_publisher_hears_its_own_echo() {
        let bus = LocalBus::new();
        let mut channel = bus.open(&key("tictactoe-AAAAA")).await.unwrap();

        channel.send(envelope("host", Message::JoinRequest)).await;

        let received = channel.recv().await.unwrap();
        assert_eq!(received.sender, PeerId::new("host".to_string()));
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let bus = LocalBus::new();
        let mut room_a = bus.open(&key("tictactoe-AAAAA")).await.unwrap();
        let mut room_b = bus.open(&key("tictactoe-BBBBB")).await.unwrap();

        room_a.send(envelope("host", Message::Restart)).await;
        room_a.recv().await.unwrap();

        let unrelated = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            room_b.recv(),
        )
        .await;
        assert!(unrelated.is_err());
    }

    #[tokio::test]
    async fn test_closing_last_channel_drops_the_topic() {
        let bus = LocalBus::new();
        let channel = bus.open(&key("tictactoe-AAAAA")).await.unwrap();

        channel.close().await;

        assert!(bus.topics.lock().await.is_empty());
    }
}
