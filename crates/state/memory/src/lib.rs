mod ports;
mod store;

pub use store::MemoryRepository;
