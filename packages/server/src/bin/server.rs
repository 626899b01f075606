//! Room-based WebSocket broadcast hub.
//!
//! Clients connect to `/ws?username=<name>&room=<room>` and exchange chat
//! messages with the other members of their room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use hiroba_server::{
    domain::{MessagePusher, RoomRepository},
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    ui::Server,
    usecase::{
        Dispatcher, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        LifecycleManager,
    },
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Room-based WebSocket broadcast hub", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8181")]
    port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // 1. Room registry (in-memory)
    let repository: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());

    // 2. MessagePusher (WebSocket outbound queues)
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::default());

    // 3. UseCases
    let dispatcher = Arc::new(Dispatcher::new(repository.clone(), message_pusher.clone()));
    let lifecycle_manager = Arc::new(LifecycleManager::new(
        Arc::new(JoinRoomUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        Arc::new(LeaveRoomUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        dispatcher,
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(repository.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(repository));

    // 4. Server
    let server = Server::new(lifecycle_manager, get_rooms_usecase, get_room_detail_usecase);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
