//! UseCase layer: orchestrates the domain through the repository and message
//! pusher interfaces.

pub mod dispatch;
pub mod error;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod lifecycle;

pub use dispatch::{DirectOutcome, Dispatcher};
pub use error::{GetRoomDetailError, JoinError};
pub use get_rooms::{GetRoomDetailUseCase, GetRoomsUseCase};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use lifecycle::{ConnectionLifecycle, LifecycleManager, LifecycleState, ReceiveEvent};
