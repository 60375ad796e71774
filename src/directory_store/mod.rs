mod models;
mod null_store;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use null_store::NullDirectoryStore;
pub use store::SqliteDirectoryStore;
pub use trait_def::{DirectoryStore, StatusTransition, StoreWriteError};
