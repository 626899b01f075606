//! UseCase: ルーム情報の取得（HTTP API 用）

use std::sync::Arc;

use crate::domain::{Room, RoomName, RoomRepository};

use super::error::GetRoomDetailError;

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 全ルームのスナップショット（名前順）
    pub async fn execute(&self) -> Vec<Room> {
        self.repository.rooms().await
    }
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, name: RoomName) -> Result<Room, GetRoomDetailError> {
        self.repository
            .room(&name)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound(name))
    }
}
