//! In-memory implementations

pub mod room;

pub use room::InMemoryRoomRepository;
