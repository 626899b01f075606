//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 参加直後から他メンバーのイベントを受け取れるよう、送信キューの登録が
//!   ルーム参加より先に行われている必要がある
//! - 参加に失敗した場合に送信キューが残らないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続の参加
//! - 異常系：同じ接続の二重参加

use std::sync::Arc;

use crate::domain::{Connection, MessagePusher, PusherChannel, RoomRepository};

use super::error::JoinError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（ルームレジストリの抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection` - 参加する接続
    /// * `sender` - 接続への送信キュー
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 参加成功
    /// * `Err(JoinError)` - 参加失敗（このメソッドが登録した送信キューは取り消される）
    pub async fn execute(
        &self,
        connection: Connection,
        sender: PusherChannel,
    ) -> Result<(), JoinError> {
        let connection_id = connection.id;
        let room = connection.room.clone();

        // 1. 送信キューを登録（参加直後のブロードキャストを取りこぼさないため先に行う）
        //    登録済みの ID なら既存のキューには触れずに中断する
        self.message_pusher
            .register_client(connection_id, sender)
            .await?;

        // 2. ルームに参加（ルームが無ければ作成される）
        if let Err(e) = self.repository.join(&room, connection).await {
            self.message_pusher.unregister_client(&connection_id).await;
            return Err(e.into());
        }

        Ok(())
    }
}
