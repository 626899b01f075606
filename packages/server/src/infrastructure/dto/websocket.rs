//! WebSocket frame payloads.
//!
//! Field names are capitalized on the wire (`From`, `Type`, `Message`).

use serde::{Deserialize, Serialize};

/// Event type tag of an outbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "New User")]
    NewUser,
    #[serde(rename = "Chat")]
    Chat,
    #[serde(rename = "Leave")]
    Leave,
}

/// Client to server frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundPayload {
    #[serde(rename = "Message", alias = "message", default)]
    pub message: String,
}

/// Server to client frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPayload {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Type")]
    pub r#type: EventType,
    #[serde(rename = "Message")]
    pub message: String,
}
