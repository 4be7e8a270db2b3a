use std::{
	collections::HashMap,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use time::OffsetDateTime;
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use branchbook_domain::{CanonicalFilter, PageRequest};
use branchbook_storage::{
	BoxFuture, CacheStore, Error as StoreError, RecordStore, Result as StoreResult,
	models::CustomerRecord,
};

/// Injected misbehaviour for an in-memory store.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Fault {
	#[default]
	None,
	/// Every call returns an error.
	Fail,
	/// Every call never completes.
	Stall,
}

pub fn customer(
	seq: u128,
	branch_id: &str,
	name: &str,
	mobile: &str,
	created_at: OffsetDateTime,
) -> CustomerRecord {
	CustomerRecord {
		id: Uuid::from_u128(seq),
		name: name.to_string(),
		mobile: mobile.to_string(),
		comment: format!("comment {seq}"),
		branch_id: branch_id.to_string(),
		created_at,
	}
}

#[derive(Default)]
pub struct MemoryRecordStore {
	records: Mutex<Vec<CustomerRecord>>,
	latency: Option<Duration>,
	fault: Mutex<Fault>,
	fetch_calls: AtomicUsize,
	count_calls: AtomicUsize,
}
impl MemoryRecordStore {
	pub fn new(records: Vec<CustomerRecord>) -> Self {
		Self { records: Mutex::new(records), ..Default::default() }
	}

	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);

		self
	}

	pub fn insert(&self, record: CustomerRecord) {
		self.records.lock().unwrap_or_else(|err| err.into_inner()).push(record);
	}

	pub fn set_fault(&self, fault: Fault) {
		*self.fault.lock().unwrap_or_else(|err| err.into_inner()) = fault;
	}

	pub fn fetch_calls(&self) -> usize {
		self.fetch_calls.load(Ordering::SeqCst)
	}

	pub fn count_calls(&self) -> usize {
		self.count_calls.load(Ordering::SeqCst)
	}

	async fn enter(&self) -> StoreResult<()> {
		if let Some(latency) = self.latency {
			sleep(latency).await;
		}

		let fault = *self.fault.lock().unwrap_or_else(|err| err.into_inner());

		apply_fault(fault, "Record store").await
	}

	fn matching(&self, filter: &CanonicalFilter) -> Vec<CustomerRecord> {
		let records = self.records.lock().unwrap_or_else(|err| err.into_inner());

		records
			.iter()
			.filter(|record| filter.matches(&record.branch_id, &record.name, &record.mobile))
			.cloned()
			.collect()
	}
}
impl RecordStore for MemoryRecordStore {
	fn fetch_page<'a>(
		&'a self,
		filter: &'a CanonicalFilter,
		page: PageRequest,
	) -> BoxFuture<'a, StoreResult<Vec<CustomerRecord>>> {
		Box::pin(async move {
			self.fetch_calls.fetch_add(1, Ordering::SeqCst);
			self.enter().await?;

			let mut matched = self.matching(filter);

			matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

			let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
			let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);

			Ok(matched.into_iter().skip(skip).take(limit).collect())
		})
	}

	fn count<'a>(&'a self, filter: &'a CanonicalFilter) -> BoxFuture<'a, StoreResult<u64>> {
		Box::pin(async move {
			self.count_calls.fetch_add(1, Ordering::SeqCst);
			self.enter().await?;

			Ok(self.matching(filter).len() as u64)
		})
	}
}

/// TTL cache on the tokio clock, so paused-time tests can expire entries.
#[derive(Default)]
pub struct MemoryCacheStore {
	entries: Mutex<HashMap<String, (String, Instant)>>,
	fault: Mutex<Fault>,
	get_calls: AtomicUsize,
	set_calls: AtomicUsize,
}
impl MemoryCacheStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_fault(&self, fault: Fault) {
		*self.fault.lock().unwrap_or_else(|err| err.into_inner()) = fault;
	}

	pub fn get_calls(&self) -> usize {
		self.get_calls.load(Ordering::SeqCst)
	}

	pub fn set_calls(&self) -> usize {
		self.set_calls.load(Ordering::SeqCst)
	}

	/// Raw payload for `key`, ignoring expiry.
	pub fn payload(&self, key: &str) -> Option<String> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.get(key).map(|(payload, _)| payload.clone())
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	async fn enter(&self) -> StoreResult<()> {
		let fault = *self.fault.lock().unwrap_or_else(|err| err.into_inner());

		apply_fault(fault, "Cache store").await
	}
}
impl CacheStore for MemoryCacheStore {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>> {
		Box::pin(async move {
			self.get_calls.fetch_add(1, Ordering::SeqCst);
			self.enter().await?;

			let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
			let payload = entries
				.get(key)
				.filter(|(_, expires_at)| *expires_at > Instant::now())
				.map(|(payload, _)| payload.clone());

			Ok(payload)
		})
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		payload: String,
		ttl: Duration,
	) -> BoxFuture<'a, StoreResult<()>> {
		Box::pin(async move {
			self.set_calls.fetch_add(1, Ordering::SeqCst);
			self.enter().await?;

			let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

			entries.insert(key.to_string(), (payload, Instant::now() + ttl));

			Ok(())
		})
	}
}

async fn apply_fault(fault: Fault, label: &str) -> StoreResult<()> {
	match fault {
		Fault::None => Ok(()),
		Fault::Fail => Err(StoreError::Unavailable(format!("{label} is unavailable."))),
		Fault::Stall => std::future::pending().await,
	}
}
