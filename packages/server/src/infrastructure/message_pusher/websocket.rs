//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を ConnectionId で管理
//! - ドメインイベントを送信フレーム（JSON）に変換して送信キューへ投入
//!
//! ## 設計ノート
//!
//! WebSocket の sink への書き込みは UI 層の送信タスクだけが行います。
//! 他の接続タスクはこのキューに投入するだけなので、複数タスクからの同時送信でも
//! sink が競合することはありません。

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, OutboundEvent, PusherChannel},
    infrastructure::dto::websocket::OutboundPayload,
};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信キュー
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(), MessagePushError> {
        let mut clients = self.clients.lock().await;
        match clients.entry(connection_id) {
            Entry::Occupied(_) => Err(MessagePushError::AlreadyRegistered(connection_id)),
            Entry::Vacant(entry) => {
                entry.insert(sender);
                tracing::debug!("Connection {} registered to MessagePusher", connection_id);
                Ok(())
            }
        }
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!("Connection {} unregistered from MessagePusher", connection_id);
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        let frame = serde_json::to_string(&OutboundPayload::from(event))
            .map_err(|e| MessagePushError::Encode(e.to_string()))?;

        let clients = self.clients.lock().await;
        let sender = clients
            .get(connection_id)
            .ok_or(MessagePushError::ClientNotFound(*connection_id))?;
        sender
            .send(frame)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;

        tracing::debug!("Pushed {:?} event to connection {}", event.kind, connection_id);
        Ok(())
    }
}
