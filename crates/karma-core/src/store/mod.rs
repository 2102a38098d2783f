//! Property store backends.

mod memory;
mod sqlite;

pub use memory::InMemoryPropertyStore;
pub use sqlite::SqlitePropertyStore;
