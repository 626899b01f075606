//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! 全ルームを 1 つの `Mutex<HashMap>` で保持し、変更とスナップショット取得を
//! すべてこのロックの下で直列化します。スナップショットはロック内で clone され、
//! 呼び出し側はロックを保持せずに反復できます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use hiroba_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, RepositoryError, Room, RoomName, RoomRepository, Timestamp,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    /// ルーム名 → Room
    rooms: Mutex<HashMap<RoomName, Room>>,
    /// ルーム作成時刻の取得元
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// システム時刻を使う空のレジストリを作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 任意の Clock を使う空のレジストリを作成
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn ensure_room(&self, name: &RoomName) -> Room {
        let mut rooms = self.rooms.lock().await;
        let created_at = self.now();
        rooms
            .entry(name.clone())
            .or_insert_with(|| {
                tracing::info!("Room '{}' created", name);
                Room::new(name.clone(), created_at)
            })
            .clone()
    }

    async fn join(&self, name: &RoomName, connection: Connection) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let created_at = self.now();
        let room = rooms.entry(name.clone()).or_insert_with(|| {
            tracing::info!("Room '{}' created", name);
            Room::new(name.clone(), created_at)
        });

        let connection_id = connection.id;
        room.add_member(connection)?;
        tracing::debug!(
            "Connection {} joined room '{}' ({} members)",
            connection_id,
            name,
            room.members.len()
        );
        Ok(())
    }

    async fn leave(&self, name: &RoomName, connection_id: &ConnectionId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get_mut(name) else {
            return false;
        };

        let removed = room.remove_member(connection_id);
        if removed && room.is_empty() {
            rooms.remove(name);
            tracing::info!("Room '{}' is empty and was removed", name);
        }
        removed
    }

    async fn members(&self, name: &RoomName) -> Option<Vec<Connection>> {
        let rooms = self.rooms.lock().await;
        rooms.get(name).map(|room| room.members.clone())
    }

    async fn room(&self, name: &RoomName) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms.get(name).cloned()
    }

    async fn rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        let mut snapshot: Vec<Room> = rooms.values().cloned().collect();
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot
    }
}
