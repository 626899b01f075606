//! UseCase errors

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError, RoomName};

/// Failure to bring a new connection into its room
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Push(#[from] MessagePushError),
}

/// Failure to look up one room
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found: '{0}'")]
    RoomNotFound(RoomName),
}
