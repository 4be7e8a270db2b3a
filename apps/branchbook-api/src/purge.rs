use std::time::Duration;

use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::time::{self as tokio_time, MissedTickBehavior};

use branchbook_storage::cache;

/// Deletes expired cache rows every `interval`. Never returns.
pub async fn run_cache_purge(pool: PgPool, interval: Duration) {
	let mut ticker = tokio_time::interval(interval);

	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		ticker.tick().await;

		match cache::purge_expired(&pool, OffsetDateTime::now_utc()).await {
			Ok(0) => {},
			Ok(count) => tracing::info!(count, "Purged expired query cache entries."),
			Err(err) => tracing::error!(error = %err, "Query cache cleanup failed."),
		}
	}
}
