use std::time::Duration;

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::{BoxFuture, CacheStore, Result};

/// Query-result cache kept in the `query_cache` table.
#[derive(Clone)]
pub struct PgCacheStore {
	pool: PgPool,
}
impl PgCacheStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}
impl CacheStore for PgCacheStore {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(fetch_payload(&self.pool, key, OffsetDateTime::now_utc()))
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		payload: String,
		ttl: Duration,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(store_payload(&self.pool, key, payload, OffsetDateTime::now_utc(), ttl))
	}
}

pub async fn fetch_payload(
	pool: &PgPool,
	key: &str,
	now: OffsetDateTime,
) -> Result<Option<String>> {
	let payload: Option<String> = sqlx::query_scalar(
		"SELECT payload FROM query_cache WHERE cache_key = $1 AND expires_at > $2",
	)
	.bind(key)
	.bind(now)
	.fetch_optional(pool)
	.await?;

	Ok(payload)
}

pub async fn store_payload(
	pool: &PgPool,
	key: &str,
	payload: String,
	now: OffsetDateTime,
	ttl: Duration,
) -> Result<()> {
	let expires_at = now + ttl;

	sqlx::query(
		"\
INSERT INTO query_cache (cache_key, payload, created_at, expires_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (cache_key) DO UPDATE
SET
	payload = EXCLUDED.payload,
	created_at = EXCLUDED.created_at,
	expires_at = EXCLUDED.expires_at",
	)
	.bind(key)
	.bind(payload)
	.bind(now)
	.bind(expires_at)
	.execute(pool)
	.await?;

	Ok(())
}

/// Deletes expired rows and returns how many were removed.
pub async fn purge_expired(pool: &PgPool, now: OffsetDateTime) -> Result<u64> {
	let result = sqlx::query("DELETE FROM query_cache WHERE expires_at <= $1")
		.bind(now)
		.execute(pool)
		.await?;

	Ok(result.rows_affected())
}
