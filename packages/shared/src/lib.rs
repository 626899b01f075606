//! Utilities shared by the hiroba binaries: logging setup and time helpers.

pub mod logger;
pub mod time;
