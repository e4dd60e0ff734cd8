#![forbid(unsafe_code)]

pub mod live;
pub mod repository;
pub mod sqlite;

pub use live::{ChangeFeed, LiveQuery, StoreChange};
pub use repository::{Storage, StorageError};
