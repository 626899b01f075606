//! Room-based WebSocket broadcast hub.
//!
//! Clients join a named room and exchange chat messages that are either
//! broadcast to every other room member or routed to a single member.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
