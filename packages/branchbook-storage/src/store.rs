use std::{future::Future, pin::Pin, time::Duration};

use branchbook_domain::{CanonicalFilter, PageRequest};

use crate::{Result, models::CustomerRecord};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read side of the customer record store.
pub trait RecordStore
where
	Self: Send + Sync,
{
	/// Rows matching `filter`, newest first with ties broken by ascending id, after skipping
	/// `page.skip()` rows and returning at most `page.limit()`.
	fn fetch_page<'a>(
		&'a self,
		filter: &'a CanonicalFilter,
		page: PageRequest,
	) -> BoxFuture<'a, Result<Vec<CustomerRecord>>>;

	fn count<'a>(&'a self, filter: &'a CanonicalFilter) -> BoxFuture<'a, Result<u64>>;
}

/// Key-value store whose entries expire after a TTL.
pub trait CacheStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>>;

	fn set<'a>(&'a self, key: &'a str, payload: String, ttl: Duration)
	-> BoxFuture<'a, Result<()>>;
}
