use std::{future::Future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use branchbook_domain::{
	CacheKey, CanonicalFilter, Identity, PageRequest, SearchPattern, total_pages,
};
use branchbook_storage::models::CustomerRecord;

use crate::{DirectoryService, Error, Result};

/// Raw query parameters; parsing is lenient and falls back to defaults.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListCustomersRequest {
	pub search: Option<String>,
	pub page: Option<String>,
	pub limit: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerItem {
	pub id: Uuid,
	pub name: String,
	pub mobile: String,
	pub comment: String,
	#[serde(with = "crate::time_serde")]
	pub date: OffsetDateTime,
	pub branch_id: String,
}
impl From<CustomerRecord> for CustomerItem {
	fn from(record: CustomerRecord) -> Self {
		Self {
			id: record.id,
			name: record.name,
			mobile: record.mobile,
			comment: record.comment,
			date: record.created_at,
			branch_id: record.branch_id,
		}
	}
}

/// One page of visible customers. This is also the cached payload.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
	pub page: u32,
	pub limit: u32,
	pub total: u64,
	pub total_pages: u64,
	pub records: Vec<CustomerItem>,
}
impl ResultPage {
	pub fn new(request: PageRequest, total: u64, records: Vec<CustomerRecord>) -> Self {
		Self {
			page: request.page(),
			limit: request.limit(),
			total,
			total_pages: total_pages(total, request.limit()),
			records: records.into_iter().map(CustomerItem::from).collect(),
		}
	}
}

impl DirectoryService {
	pub async fn list_customers(
		&self,
		identity: &Identity,
		req: ListCustomersRequest,
	) -> Result<Arc<ResultPage>> {
		let scope = branchbook_domain::resolve(identity)?;
		let filter =
			CanonicalFilter::new(scope.filter, SearchPattern::parse(req.search.as_deref()));
		let page = PageRequest::parse(
			req.page.as_deref(),
			req.limit.as_deref(),
			self.cfg.pagination.max_limit,
		);
		let key = CacheKey::encode(&self.cfg.cache.schema_version, scope.role, &filter, page);

		if let Some(cached) = self.read_cache(&key).await {
			return Ok(cached);
		}

		self.flights.run(key.as_str(), || self.load_page(&key, &filter, page)).await
	}

	async fn load_page(
		&self,
		key: &CacheKey,
		filter: &CanonicalFilter,
		page: PageRequest,
	) -> Result<Arc<ResultPage>> {
		// A previous flight for this key may have stored the page after our first read.
		if let Some(cached) = self.read_cache(key).await {
			return Ok(cached);
		}

		let timeout = Duration::from_millis(self.cfg.records.timeout_ms);
		let (records, total) = tokio::try_join!(
			bounded(timeout, "fetch", self.records.fetch_page(filter, page)),
			bounded(timeout, "count", self.records.count(filter)),
		)?;
		let result = Arc::new(ResultPage::new(page, total, records));

		self.write_cache(key, &result).await;

		Ok(result)
	}

	async fn read_cache(&self, key: &CacheKey) -> Option<Arc<ResultPage>> {
		if !self.cfg.cache.enabled {
			return None;
		}

		let timeout = Duration::from_millis(self.cfg.cache.timeout_ms);
		let payload = match tokio::time::timeout(timeout, self.cache.get(key.as_str())).await {
			Ok(Ok(Some(payload))) => payload,
			Ok(Ok(None)) => {
				tracing::info!(
					cache_key_fingerprint = %key.fingerprint(),
					hit = false,
					"Cache miss."
				);

				return None;
			},
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					cache_key_fingerprint = %key.fingerprint(),
					"Cache read failed."
				);

				return None;
			},
			Err(_) => {
				tracing::warn!(
					cache_key_fingerprint = %key.fingerprint(),
					timeout_ms = self.cfg.cache.timeout_ms,
					"Cache read timed out."
				);

				return None;
			},
		};

		match serde_json::from_str::<ResultPage>(&payload) {
			Ok(page) => {
				tracing::info!(
					cache_key_fingerprint = %key.fingerprint(),
					hit = true,
					payload_size = payload.len(),
					"Cache hit."
				);

				Some(Arc::new(page))
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_fingerprint = %key.fingerprint(),
					"Cache payload decode failed."
				);

				None
			},
		}
	}

	async fn write_cache(&self, key: &CacheKey, page: &ResultPage) {
		let cache_cfg = &self.cfg.cache;

		if !cache_cfg.enabled {
			return;
		}

		let payload = match serde_json::to_string(page) {
			Ok(payload) => payload,
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_fingerprint = %key.fingerprint(),
					"Cache payload encode failed."
				);

				return;
			},
		};
		let payload_size = payload.len() as u64;

		if let Some(max) = cache_cfg.max_payload_bytes
			&& payload_size > max
		{
			tracing::warn!(
				cache_key_fingerprint = %key.fingerprint(),
				payload_size,
				max_payload_bytes = max,
				"Cache payload skipped due to size."
			);

			return;
		}

		let ttl = Duration::from_secs(cache_cfg.ttl_secs);
		let timeout = Duration::from_millis(cache_cfg.timeout_ms);

		match tokio::time::timeout(timeout, self.cache.set(key.as_str(), payload, ttl)).await {
			Ok(Ok(())) => {
				tracing::info!(
					cache_key_fingerprint = %key.fingerprint(),
					payload_size,
					ttl_secs = cache_cfg.ttl_secs,
					"Cache stored."
				);
			},
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					cache_key_fingerprint = %key.fingerprint(),
					"Cache write failed."
				);
			},
			Err(_) => {
				tracing::warn!(
					cache_key_fingerprint = %key.fingerprint(),
					timeout_ms = cache_cfg.timeout_ms,
					"Cache write timed out."
				);
			},
		}
	}
}

async fn bounded<T>(
	timeout: Duration,
	op: &'static str,
	fut: impl Future<Output = branchbook_storage::Result<T>>,
) -> Result<T> {
	match tokio::time::timeout(timeout, fut).await {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(err)) => {
			tracing::error!(error = %err, op, "Customer query failed.");

			Err(Error::RecordStore { message: format!("Customer {op} failed: {err}") })
		},
		Err(_) => {
			tracing::error!(op, timeout_ms = timeout.as_millis() as u64, "Customer query timed out.");

			Err(Error::RecordStore {
				message: format!("Customer {op} timed out after {}ms.", timeout.as_millis()),
			})
		},
	}
}
