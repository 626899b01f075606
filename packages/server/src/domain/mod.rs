//! Domain layer: entities, value objects and the interfaces the
//! infrastructure layer implements.

pub mod entity;
pub mod error;
pub mod factory;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{
    Connection, DIRECT_MESSAGE_MARKER, EventKind, InboundMessage, InboundRoute, OutboundEvent,
    Room, SYSTEM_SENDER, USER_NOT_FOUND_TEXT,
};
pub use error::{MessagePushError, RepositoryError};
pub use factory::ConnectionIdFactory;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::RoomRepository;
pub use value_object::{ConnectionId, RoomName, Timestamp, Username};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
