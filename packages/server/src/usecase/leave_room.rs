//! UseCase: ルーム退出処理

use std::sync::Arc;

use crate::domain::{Connection, MessagePusher, RoomRepository};

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    /// Repository（ルームレジストリの抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// ルーム退出を実行
    ///
    /// 既に退出済みでも失敗しない。
    ///
    /// # Returns
    ///
    /// 今回の呼び出しでメンバーから削除された場合 `true`
    pub async fn execute(&self, connection: &Connection) -> bool {
        // 1. ルームから削除（空になったルームは削除される）
        let removed = self
            .repository
            .leave(&connection.room, &connection.id)
            .await;

        // 2. 送信キューを解放
        self.message_pusher.unregister_client(&connection.id).await;

        removed
    }
}
