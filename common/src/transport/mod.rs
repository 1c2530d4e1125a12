use std::future::Future;

use crate::messages::Envelope;
use crate::room_code::ChannelKey;

mod local_bus;
pub mod wire;

pub use local_bus::{LocalBus, LocalChannel};

/// A publish/subscribe medium that can open topic-scoped channels. The
/// session protocol only ever talks to this interface; whether the medium is
/// the in-process bus or a remote relay is a backend choice.
pub trait Transport: Send + Sync + Clone + 'static {
    type Channel: TransportChannel;

    /// Establishes a logical channel scoped to `key`. A connection failure
    /// surfaces here; it is never retried by the transport itself.
    fn open(&self, key: &ChannelKey) -> impl Future<Output = Result<Self::Channel, String>> + Send;
}

/// One open channel. Delivery is best-effort and unacknowledged, and the
/// medium echoes a sender's own publishes back to it; receivers filter
/// echoes by peer id.
pub trait TransportChannel: Send + 'static {
    /// Best-effort send. Failures are logged and swallowed; the protocol
    /// must not assume delivery.
    fn send(&mut self, envelope: Envelope) -> impl Future<Output = ()> + Send;

    /// Next message on the channel, or `None` once the medium is gone.
    fn recv(&mut self) -> impl Future<Output = Option<Envelope>> + Send;

    /// Releases the channel. No message is delivered after this resolves.
    fn close(self) -> impl Future<Output = ()> + Send;
}
