//! Room registry implementations

pub mod inmemory;

pub use inmemory::InMemoryRoomRepository;
