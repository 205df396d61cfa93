pub mod defs;
pub mod memory;
pub mod state;

pub use defs::KeyValueStore;
pub use memory::MemoryStore;
pub use state::SqliteStore;
