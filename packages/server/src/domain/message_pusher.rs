//! Outbound delivery interface
//!
//! Each connection registers the sending half of its outbound channel here.
//! Usecases push domain events by connection id without knowing about the
//! transport.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, OutboundEvent};

/// Sending half of a connection's outbound queue (encoded frames)
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register the outbound channel of a connection. An existing
    /// registration for the same id is kept and `AlreadyRegistered` returned.
    async fn register_client(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(), MessagePushError>;

    /// Drop the outbound channel of a connection. No-op if absent.
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Push one event to one connection
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;
}
