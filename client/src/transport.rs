use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use common::log;
use common::messages::Envelope;
use common::room_code::ChannelKey;
use common::transport::wire::{RelayEvent, RelayRequest, read_frame, write_frame};
use common::transport::{Transport, TransportChannel};

/// The networked backend: one relay connection per opened channel, so a
/// retried join never inherits a stale subscription.
#[derive(Clone)]
pub struct BrokerTransport {
    address: String,
}

impl BrokerTransport {
    pub fn new(address: String) -> Self {
        Self { address }
    }
}

impl Transport for BrokerTransport {
    type Channel = BrokerChannel;

    async fn open(&self, key: &ChannelKey) -> Result<BrokerChannel, String> {
        let stream = TcpStream::connect(&self.address).await.map_err(|e| {
            format!("Failed to connect to relay at {}: {}", self.address, e)
        })?;
        let (read_half, mut write_half) = stream.into_split();

        let topic = key.as_str().to_string();
        write_frame(
            &mut write_half,
            &RelayRequest::Subscribe {
                topic: topic.clone(),
            },
        )
        .await
        .map_err(|e| format!("Failed to subscribe to {}: {}", topic, e))?;

        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let read_task = tokio::spawn(read_deliveries(
            BufReader::new(read_half),
            topic.clone(),
            incoming_tx,
        ));

        Ok(BrokerChannel {
            topic,
            write_half,
            incoming: incoming_rx,
            read_task,
        })
    }
}

async fn read_deliveries(
    mut reader: BufReader<OwnedReadHalf>,
    topic: String,
    incoming: mpsc::UnboundedSender<Envelope>,
) {
    loop {
        match read_frame::<_, RelayEvent>(&mut reader).await {
            Ok(Some(RelayEvent::Delivery {
                topic: delivered,
                payload,
            })) => {
                // Not our room's traffic.
                if delivered != topic {
                    continue;
                }
                match Envelope::from_json(&payload) {
                    Ok(envelope) => {
                        if incoming.send(envelope).is_err() {
                            break;
                        }
                    }
                    Err(reason) => {
                        log!("[topic:{}] Dropping message: {}", topic, reason);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                log!("[topic:{}] Relay connection lost: {}", topic, e);
                break;
            }
        }
    }
}

pub struct BrokerChannel {
    topic: String,
    write_half: OwnedWriteHalf,
    incoming: mpsc::UnboundedReceiver<Envelope>,
    read_task: JoinHandle<()>,
}

impl TransportChannel for BrokerChannel {
    async fn send(&mut self, envelope: Envelope) {
        let payload = match envelope.to_json() {
            Ok(payload) => payload,
            Err(reason) => {
                log!("[topic:{}] {}", self.topic, reason);
                return;
            }
        };

        let frame = RelayRequest::Publish {
            topic: self.topic.clone(),
            payload,
        };
        // Best-effort: a dead relay shows up through recv as a lost
        // connection, not through send.
        if let Err(e) = write_frame(&mut self.write_half, &frame).await {
            log!("[topic:{}] Failed to publish: {}", self.topic, e);
        }
    }

    async fn recv(&mut self) -> Option<Envelope> {
        self.incoming.recv().await
    }

    async fn close(mut self) {
        self.read_task.abort();
        let _ = self.write_half.shutdown().await;
    }
}

impl Drop for BrokerChannel {
    fn drop(&mut self) {
        self.read_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::messages::Message;
    use common::PeerId;
    use tokio::net::TcpListener;
    use tokio::time::{Duration, timeout};

    fn key(name: &str) -> ChannelKey {
        ChannelKey::new(name.to_string())
    }

    #[tokio::test]
    async fn test_open_surfaces_connection_failure() {
        // A listener bound and dropped leaves a port nothing accepts on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let transport = BrokerTransport::new(address);
        let result = transport.open(&key("tictactoe-AAAAA")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_subscribes_and_deliveries_flow_in() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let relay_side = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            let request: RelayRequest = read_frame(&mut reader).await.unwrap().unwrap();
            assert_eq!(
                request,
                RelayRequest::Subscribe {
                    topic: "tictactoe-AAAAA".to_string(),
                }
            );

            // Another room's delivery first: the channel must not surface it.
            let stray = Envelope::new(PeerId::new("other".to_string()), Message::Restart);
            write_frame(
                &mut write_half,
                &RelayEvent::Delivery {
                    topic: "tictactoe-BBBBB".to_string(),
                    payload: stray.to_json().unwrap(),
                },
            )
            .await
            .unwrap();

            // Then garbage, which is dropped.
            write_frame(
                &mut write_half,
                &RelayEvent::Delivery {
                    topic: "tictactoe-AAAAA".to_string(),
                    payload: "{broken".to_string(),
                },
            )
            .await
            .unwrap();

            let wanted = Envelope::new(
                PeerId::new("peer".to_string()),
                Message::Move { index: 4 },
            );
            write_frame(
                &mut write_half,
                &RelayEvent::Delivery {
                    topic: "tictactoe-AAAAA".to_string(),
                    payload: wanted.to_json().unwrap(),
                },
            )
            .await
            .unwrap();
        });

        let transport = BrokerTransport::new(address);
        let mut channel = transport.open(&key("tictactoe-AAAAA")).await.unwrap();

        let envelope = timeout(Duration::from_secs(1), channel.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(envelope.message, Message::Move { index: 4 });

        relay_side.await.unwrap();
        channel.close().await;
    }

    #[tokio::test]
    async fn test_send_publishes_on_the_subscribed_topic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let relay_side = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, _write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            let _subscribe: RelayRequest = read_frame(&mut reader).await.unwrap().unwrap();
            let publish: RelayRequest = read_frame(&mut reader).await.unwrap().unwrap();

            match publish {
                RelayRequest::Publish { topic, payload } => {
                    assert_eq!(topic, "tictactoe-AAAAA");
                    let envelope = Envelope::from_json(&payload).unwrap();
                    assert_eq!(envelope.message, Message::JoinRequest);
                }
                other => panic!("expected publish, got {:?}", other),
            }
        });

        let transport = BrokerTransport::new(address);
        let mut channel = transport.open(&key("tictactoe-AAAAA")).await.unwrap();
        channel
            .send(Envelope::new(
                PeerId::new("joiner".to_string()),
                Message::JoinRequest,
            ))
            .await;

        relay_side.await.unwrap();
        channel.close().await;
    }

    #[tokio::test]
    async fn test_relay_disappearing_surfaces_as_lost_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let relay_side = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, _write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            let _subscribe: RelayRequest = read_frame(&mut reader).await.unwrap().unwrap();
            // Dropping both halves closes the connection.
        });

        let transport = BrokerTransport::new(address);
        let mut channel = transport.open(&key("tictactoe-AAAAA")).await.unwrap();
        relay_side.await.unwrap();

        let received = timeout(Duration::from_secs(1), channel.recv()).await.unwrap();
        assert!(received.is_none());
        channel.close().await;
    }
}
