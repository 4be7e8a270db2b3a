const QUERY_CACHE_SQL: &str = "\
CREATE TABLE IF NOT EXISTS query_cache (
	cache_key text PRIMARY KEY,
	payload text NOT NULL,
	created_at timestamptz NOT NULL,
	expires_at timestamptz NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_query_cache_expires_at ON query_cache (expires_at);
";

/// DDL for the tables this service owns. The `customers` table belongs to the record store.
pub fn render_schema() -> String {
	QUERY_CACHE_SQL.to_string()
}
