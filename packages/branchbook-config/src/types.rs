use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub cache: Cache,
	pub records: Records,
	#[serde(default)]
	pub pagination: Pagination,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
	pub enabled: bool,
	/// Prefix of every cache key. Bump it whenever the cached page shape changes.
	#[serde(default = "default_cache_schema_version")]
	pub schema_version: String,
	#[serde(default = "default_cache_ttl_secs")]
	pub ttl_secs: u64,
	pub timeout_ms: u64,
	pub max_payload_bytes: Option<u64>,
	#[serde(default = "default_cache_purge_interval_secs")]
	pub purge_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Records {
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pagination {
	pub max_limit: u32,
}
impl Default for Pagination {
	fn default() -> Self {
		Self { max_limit: 100 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// HS256 secret shared with the token issuer.
	pub jwt_secret: String,
}

fn default_cache_schema_version() -> String {
	"v1".to_string()
}

fn default_cache_ttl_secs() -> u64 {
	30
}

fn default_cache_purge_interval_secs() -> u64 {
	300
}
