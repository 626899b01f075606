//! UseCase: 接続ライフサイクル管理
//!
//! 1 つの接続を `Connecting → Active → Terminating → Terminated` の順に進めます。
//!
//! - `Connecting`: Connection を生成してルームに参加させる
//! - `Active`: 参加通知（New User）を一度だけ送り、受信イベントを Dispatcher に渡す
//! - `Terminating`: 退出通知（Leave）、ルームからの削除、送信キューの解放
//! - `Terminated`: 以降の操作は何もしない
//!
//! 終了処理はどの経路（クローズ、ストリーム終了、パニック）からでも呼ばれ、
//! 実際に行われるのは最初の一回だけです。

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use hiroba_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionIdFactory, EventKind, InboundMessage, PusherChannel, RoomName,
    Timestamp, Username,
};

use super::{Dispatcher, JoinError, JoinRoomUseCase, LeaveRoomUseCase};

/// State of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Connecting,
    Active,
    Terminating,
    Terminated,
}

/// Outcome of one receive on the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveEvent {
    /// A decoded client message
    Message(InboundMessage),
    /// A frame that could not be decoded; the connection stays open
    Malformed(String),
    /// A read error from the transport; the connection stays open
    TransportError(String),
    /// The peer closed the connection
    Closed,
}

/// Creates connection lifecycles wired to the shared usecases
pub struct LifecycleManager {
    join_room_usecase: Arc<JoinRoomUseCase>,
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
}

impl LifecycleManager {
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self::with_clock(
            join_room_usecase,
            leave_room_usecase,
            dispatcher,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        dispatcher: Arc<Dispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            join_room_usecase,
            leave_room_usecase,
            dispatcher,
            clock,
        }
    }

    /// Bring a new connection into its room and announce it.
    ///
    /// On success the returned lifecycle is `Active`. On failure nothing is
    /// left registered.
    pub async fn connect(
        &self,
        username: Username,
        room: RoomName,
        sender: PusherChannel,
    ) -> Result<ConnectionLifecycle, JoinError> {
        let connection = Connection::new(
            ConnectionIdFactory::generate(),
            username,
            room,
            Timestamp::new(self.clock.now_millis()),
        );
        let lifecycle = ConnectionLifecycle {
            connection: connection.clone(),
            state: Mutex::new(LifecycleState::Connecting),
            leave_room_usecase: self.leave_room_usecase.clone(),
            dispatcher: self.dispatcher.clone(),
        };

        self.join_room_usecase.execute(connection, sender).await?;
        *lifecycle.state.lock().await = LifecycleState::Active;

        let connection = lifecycle.connection();
        tracing::info!(
            "'{}' ({}) joined room '{}'",
            connection.username,
            connection.id,
            connection.room
        );
        self.dispatcher
            .announce(connection, EventKind::Joined)
            .await;

        Ok(lifecycle)
    }
}

/// One connection driven from join to leave
pub struct ConnectionLifecycle {
    connection: Connection,
    state: Mutex<LifecycleState>,
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    dispatcher: Arc<Dispatcher>,
}

impl ConnectionLifecycle {
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Route receive events until the peer closes or the stream ends, then
    /// terminate.
    pub async fn run<S>(&self, mut events: S)
    where
        S: Stream<Item = ReceiveEvent> + Unpin,
    {
        while let Some(event) = events.next().await {
            if self.state().await != LifecycleState::Active {
                break;
            }

            match event {
                ReceiveEvent::Message(message) => {
                    self.dispatcher
                        .route_inbound(&self.connection, &message)
                        .await;
                }
                ReceiveEvent::Malformed(reason) => {
                    tracing::warn!(
                        "Ignoring malformed frame from '{}' ({}): {}",
                        self.connection.username,
                        self.connection.id,
                        reason
                    );
                }
                ReceiveEvent::TransportError(reason) => {
                    tracing::warn!(
                        "Read error on connection {} ('{}'): {}",
                        self.connection.id,
                        self.connection.username,
                        reason
                    );
                }
                ReceiveEvent::Closed => {
                    tracing::info!(
                        "'{}' ({}) closed the connection",
                        self.connection.username,
                        self.connection.id
                    );
                    break;
                }
            }
        }

        self.terminate().await;
    }

    /// Run the receive loop in its own task so a panic inside it cannot reach
    /// the caller. The connection is terminated whatever the outcome.
    pub async fn run_isolated<S>(self: Arc<Self>, events: S)
    where
        S: Stream<Item = ReceiveEvent> + Unpin + Send + 'static,
    {
        let worker = {
            let lifecycle = self.clone();
            tokio::spawn(async move { lifecycle.run(events).await })
        };

        if let Err(e) = worker.await {
            if e.is_panic() {
                tracing::error!(
                    "Connection {} ('{}') handler panicked: {}",
                    self.connection.id,
                    self.connection.username,
                    e
                );
            } else {
                tracing::warn!(
                    "Connection {} ('{}') handler was cancelled",
                    self.connection.id,
                    self.connection.username
                );
            }
        }

        self.terminate().await;
    }

    /// Announce departure, leave the room and release the channel.
    ///
    /// Only the first call on an `Active` connection does anything; it
    /// returns `true`. Every other call returns `false`.
    pub async fn terminate(&self) -> bool {
        {
            let mut state = self.state.lock().await;
            if *state != LifecycleState::Active {
                return false;
            }
            *state = LifecycleState::Terminating;
        }

        self.dispatcher
            .announce(&self.connection, EventKind::Left)
            .await;
        let removed = self.leave_room_usecase.execute(&self.connection).await;

        *self.state.lock().await = LifecycleState::Terminated;
        tracing::info!(
            "'{}' ({}) left room '{}' (removed: {})",
            self.connection.username,
            self.connection.id,
            self.connection.room,
            removed
        );
        true
    }
}
