// HR records and the embedding ledger live in SQLite, vectors in LanceDB

pub mod lancedb;
pub mod sqlite;

pub use sqlite::*;
