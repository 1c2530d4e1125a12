use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;

use common::log;
use common::transport::wire::{RelayEvent, RelayRequest, read_frame, write_frame};

const TOPIC_CAPACITY: usize = 64;
const OUTBOX_CAPACITY: usize = 128;

/// Fan-out state shared by all connections: one broadcast channel per live
/// topic. A publish reaches every current subscriber of the topic, the
/// publisher included; there are no acknowledgements and nothing is stored.
#[derive(Clone, Default)]
pub struct TopicRegistry {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl TopicRegistry {
    async fn subscribe(&self, topic: &str) -> broadcast::Receiver<String> {
        let mut topics = self.topics.lock().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    async fn publish(&self, topic: &str, payload: String) {
        let topics = self.topics.lock().await;
        if let Some(sender) = topics.get(topic) {
            // Zero receivers just means the room is empty right now.
            let _ = sender.send(payload);
        }
    }

    async fn release(&self, topic: &str) {
        let mut topics = self.topics.lock().await;
        let abandoned = topics
            .get(topic)
            .is_some_and(|sender| sender.receiver_count() == 0);
        if abandoned {
            topics.remove(topic);
        }
    }

    pub async fn topic_count(&self) -> usize {
        self.topics.lock().await.len()
    }
}

pub struct Relay {
    listener: TcpListener,
    registry: TopicRegistry,
}

impl Relay {
    pub async fn bind(addr: &str) -> Result<Self, String> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
        Ok(Self {
            listener,
            registry: TopicRegistry::default(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, String> {
        self.listener
            .local_addr()
            .map_err(|e| format!("Failed to read local address: {}", e))
    }

    pub fn registry(&self) -> TopicRegistry {
        self.registry.clone()
    }

    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    log!("Client connected: {}", peer);
                    tokio::spawn(handle_connection(stream, self.registry.clone()));
                }
                Err(e) => {
                    log!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, registry: TopicRegistry) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let (outbox, mut outbox_rx) = mpsc::channel::<RelayEvent>(OUTBOX_CAPACITY);

    let send_task = tokio::spawn(async move {
        while let Some(event) = outbox_rx.recv().await {
            if write_frame(&mut write_half, &event).await.is_err() {
                break;
            }
        }
    });

    let mut subscription: Option<String> = None;
    let mut forward_task: Option<JoinHandle<()>> = None;

    loop {
        match read_frame::<_, RelayRequest>(&mut reader).await {
            Ok(Some(RelayRequest::Subscribe { topic })) => {
                // A connection carries one subscription; a new one replaces it.
                if let Some(task) = forward_task.take() {
                    task.abort();
                    let _ = task.await;
                }
                if let Some(old_topic) = subscription.take() {
                    registry.release(&old_topic).await;
                }

                let receiver = registry.subscribe(&topic).await;
                forward_task = Some(tokio::spawn(forward_deliveries(
                    topic.clone(),
                    receiver,
                    outbox.clone(),
                )));
                subscription = Some(topic);
            }
            Ok(Some(RelayRequest::Publish { topic, payload })) => {
                registry.publish(&topic, payload).await;
            }
            Ok(None) => break,
            Err(e) => {
                log!("[{}] Connection error: {}", peer, e);
                break;
            }
        }
    }

    if let Some(task) = forward_task.take() {
        task.abort();
        let _ = task.await;
    }
    send_task.abort();
    if let Some(topic) = subscription.take() {
        registry.release(&topic).await;
    }
    log!("Client disconnected: {}", peer);
}

async fn forward_deliveries(
    topic: String,
    mut receiver: broadcast::Receiver<String>,
    outbox: mpsc::Sender<RelayEvent>,
) {
    loop {
        match receiver.recv().await {
            Ok(payload) => {
                let event = RelayEvent::Delivery {
                    topic: topic.clone(),
                    payload,
                };
                if outbox.send(event).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log!("[topic:{}] Subscriber lagged, skipped {} messages", topic, skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
