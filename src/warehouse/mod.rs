mod memory_store;
mod models;
mod schema;
mod store;
mod trait_def;

#[cfg(feature = "mock")]
pub use trait_def::{MockSink, MockSongLookup};

pub use memory_store::InMemoryWarehouse;
pub use models::*;
pub use schema::WAREHOUSE_VERSIONED_SCHEMAS;
pub use store::{FileBatch, SqliteWarehouse, WarehouseCounts};
pub use trait_def::{BatchScope, Sink, SongLookup};
