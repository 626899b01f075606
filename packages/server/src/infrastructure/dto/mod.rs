//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame payloads
//! - `http`: HTTP API response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
