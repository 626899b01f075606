//! Domain errors

use thiserror::Error;

use super::{ConnectionId, RoomName};

/// Room registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The connection is already a member of the room. Joining twice is a
    /// caller bug and is never silently deduplicated.
    #[error("connection {connection_id} already joined room '{room}'")]
    AlreadyJoined {
        connection_id: ConnectionId,
        room: RoomName,
    },
}

/// Errors raised while pushing an event to a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection already registered: {0}")]
    AlreadyRegistered(ConnectionId),
    #[error("connection not registered: {0}")]
    ClientNotFound(ConnectionId),
    #[error("failed to push message: {0}")]
    PushFailed(String),
    #[error("failed to encode message: {0}")]
    Encode(String),
}
