//! Persistence layer for diagnostic test records

pub mod memory;
pub mod store;
pub mod traits;

pub use memory::InMemoryTestStore;
pub use store::PostgresTestStore;
pub use traits::TestStore;
