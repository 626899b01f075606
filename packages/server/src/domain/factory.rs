//! Identifier factories

use uuid::Uuid;

use super::ConnectionId;

/// Generates fresh connection identifiers
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// UUID v4 based connection id
    pub fn generate() -> ConnectionId {
        ConnectionId::new(Uuid::new_v4())
    }
}
