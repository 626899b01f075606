//! Room registry interface
//!
//! The usecase layer depends on this trait only; the in-memory implementation
//! lives in the infrastructure layer.

use async_trait::async_trait;

use super::{Connection, ConnectionId, RepositoryError, Room, RoomName};

/// Mapping from room name to its member connections.
///
/// Implementations serialize every mutation and every snapshot read, so the
/// registry can be shared by all connection tasks.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Return the room, creating an empty one if it does not exist yet
    async fn ensure_room(&self, name: &RoomName) -> Room;

    /// Add a connection to the room, creating the room if needed.
    ///
    /// Joining with a connection id that is already a member is an error.
    async fn join(&self, name: &RoomName, connection: Connection) -> Result<(), RepositoryError>;

    /// Remove a connection from the room. Returns `false` if it was not a
    /// member. A room left empty is deleted.
    async fn leave(&self, name: &RoomName, connection_id: &ConnectionId) -> bool;

    /// Snapshot of the room's members in join order, `None` if the room does
    /// not exist
    async fn members(&self, name: &RoomName) -> Option<Vec<Connection>>;

    /// Snapshot of one room
    async fn room(&self, name: &RoomName) -> Option<Room>;

    /// Snapshot of every room, sorted by name
    async fn rooms(&self) -> Vec<Room>;
}
