pub mod game;
pub mod identifiers;
pub mod logger;
pub mod messages;
pub mod room_code;
pub mod session;
pub mod transport;

pub use identifiers::PeerId;
pub use room_code::{ChannelKey, RoomCode};
