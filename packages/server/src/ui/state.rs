//! Shared application state.

use std::sync::Arc;

use crate::usecase::{GetRoomDetailUseCase, GetRoomsUseCase, LifecycleManager};

/// State handed to every axum handler
pub struct AppState {
    /// Creates and wires each WebSocket connection's lifecycle
    pub lifecycle_manager: Arc<LifecycleManager>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}
