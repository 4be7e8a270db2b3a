pub mod cache;
pub mod customers;
pub mod db;
pub mod models;
pub mod schema;
pub mod store;

mod error;

pub use error::Error;
pub use store::{BoxFuture, CacheStore, RecordStore};

pub type Result<T, E = Error> = std::result::Result<T, E>;
