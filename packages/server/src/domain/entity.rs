//! Entities
//!
//! `Room` owns the membership invariants; `InboundMessage` owns the routing
//! decision between broadcast and direct delivery.

use super::{ConnectionId, RepositoryError, RoomName, Timestamp, Username};

/// Sender name used for replies generated by the server itself
pub const SYSTEM_SENDER: &str = "System";

/// Reply text when a direct message names nobody in the room
pub const USER_NOT_FOUND_TEXT: &str = "User not found";

/// First token of an inbound text that requests direct delivery
pub const DIRECT_MESSAGE_MARKER: &str = "/direct";

/// One client's session. `username` and `room` never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub username: Username,
    pub room: RoomName,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        username: Username,
        room: RoomName,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            username,
            room,
            connected_at,
        }
    }
}

/// A named set of connections sharing broadcast scope.
///
/// Members are kept in join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: RoomName,
    pub members: Vec<Connection>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(name: RoomName, created_at: Timestamp) -> Self {
        Self {
            name,
            members: Vec::new(),
            created_at,
        }
    }

    /// Add a member. Fails if a member with the same connection id exists.
    pub fn add_member(&mut self, connection: Connection) -> Result<(), RepositoryError> {
        if self.contains(&connection.id) {
            return Err(RepositoryError::AlreadyJoined {
                connection_id: connection.id,
                room: self.name.clone(),
            });
        }
        self.members.push(connection);
        Ok(())
    }

    /// Remove a member, returning whether it was present
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| &member.id != connection_id);
        self.members.len() != before
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members.iter().any(|member| &member.id == connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// First member in join order with the given username
    pub fn find_by_username(&self, username: &Username) -> Option<&Connection> {
        self.members.iter().find(|member| &member.username == username)
    }
}

/// Kind of an event delivered to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Joined,
    Chat,
    Left,
}

/// Server to client payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEvent {
    pub from: String,
    pub kind: EventKind,
    pub text: String,
}

impl OutboundEvent {
    pub fn new(from: impl Into<String>, kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            kind,
            text: text.into(),
        }
    }

    /// Join/leave announcement, which never carries text
    pub fn announcement(from: &Username, kind: EventKind) -> Self {
        Self::new(from.as_str(), kind, "")
    }

    /// Reply to a direct message whose target is not in the room
    pub fn user_not_found() -> Self {
        Self::new(SYSTEM_SENDER, EventKind::Chat, USER_NOT_FOUND_TEXT)
    }
}

/// Where an inbound message should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRoute {
    /// Deliver the full text to every other room member
    Broadcast(String),
    /// Deliver `text` to one member. `target` is `None` when the marker was
    /// not followed by a username.
    Direct {
        target: Option<Username>,
        text: String,
    },
}

/// Client to server payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub text: String,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Decide how this message is routed.
    ///
    /// `/direct <target> <text...>` is a direct message when the marker is
    /// the exact first token. Anything else, including `/directory`, is a
    /// broadcast of the untouched text.
    pub fn route(&self) -> InboundRoute {
        let mut head = self.text.splitn(2, char::is_whitespace);
        if head.next() != Some(DIRECT_MESSAGE_MARKER) {
            return InboundRoute::Broadcast(self.text.clone());
        }

        let rest = head.next().unwrap_or_default().trim_start();
        let mut tail = rest.splitn(2, char::is_whitespace);
        let target = tail
            .next()
            .filter(|name| !name.is_empty())
            .map(Username::from);
        let text = tail.next().unwrap_or_default().trim().to_string();

        InboundRoute::Direct { target, text }
    }
}
