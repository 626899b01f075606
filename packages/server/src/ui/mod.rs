//! Transport layer: axum router, WebSocket upgrade and HTTP inspection API.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
