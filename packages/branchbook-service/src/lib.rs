pub mod customers;
pub mod envelope;
pub mod flight;
pub mod time_serde;

mod error;

pub use customers::{CustomerItem, ListCustomersRequest, ResultPage};
pub use envelope::Envelope;
pub use error::{Error, Result};

use std::sync::Arc;

use branchbook_config::Config;
use branchbook_storage::{
	CacheStore, RecordStore, cache::PgCacheStore, customers::PgRecordStore, db::Db,
};

use crate::flight::Flights;

/// Role-scoped customer directory with a read-through result cache.
pub struct DirectoryService {
	pub cfg: Config,
	records: Arc<dyn RecordStore>,
	cache: Arc<dyn CacheStore>,
	flights: Flights<Result<Arc<ResultPage>>>,
}
impl DirectoryService {
	pub fn new(cfg: Config, db: &Db) -> Self {
		let records = Arc::new(PgRecordStore::new(db.pool.clone()));
		let cache = Arc::new(PgCacheStore::new(db.pool.clone()));

		Self::with_stores(cfg, records, cache)
	}

	pub fn with_stores(
		cfg: Config,
		records: Arc<dyn RecordStore>,
		cache: Arc<dyn CacheStore>,
	) -> Self {
		Self { cfg, records, cache, flights: Flights::new() }
	}
}
