//! Document store abstraction and implementations
//!
//! The trait-based design allows swapping between the in-memory store used
//! by tests and the SQLite-backed store used by deployments.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use traits::{DocumentStore, SummaryWrite, WriteBatch};
