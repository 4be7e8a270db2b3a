mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Cache, Config, Pagination, Postgres, Records, Security, Service, Storage};

use std::{fs, net::SocketAddr, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	let http_addr: SocketAddr = cfg.service.http_bind.parse().map_err(|_| Error::Validation {
		message: "service.http_bind must be a socket address.".to_string(),
	})?;

	if cfg.security.bind_localhost_only && !http_addr.ip().is_loopback() {
		return Err(Error::Validation {
			message: "service.http_bind must be a loopback address when security.bind_localhost_only is true."
				.to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.schema_version.is_empty() {
		return Err(Error::Validation {
			message: "cache.schema_version must be non-empty.".to_string(),
		});
	}
	// The version is the first segment of a colon-separated cache key.
	if cfg.cache.schema_version.contains(':') {
		return Err(Error::Validation {
			message: "cache.schema_version must not contain ':'.".to_string(),
		});
	}
	if cfg.cache.ttl_secs == 0 {
		return Err(Error::Validation {
			message: "cache.ttl_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "cache.timeout_ms must be greater than zero.".to_string(),
		});
	}

	if let Some(max) = cfg.cache.max_payload_bytes
		&& max == 0
	{
		return Err(Error::Validation {
			message: "cache.max_payload_bytes must be greater than zero.".to_string(),
		});
	}

	if cfg.cache.purge_interval_secs == 0 {
		return Err(Error::Validation {
			message: "cache.purge_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.records.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "records.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.pagination.max_limit == 0 {
		return Err(Error::Validation {
			message: "pagination.max_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.security.jwt_secret.is_empty() {
		return Err(Error::Validation {
			message: "security.jwt_secret must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.cache.schema_version = cfg.cache.schema_version.trim().to_string();
	cfg.security.jwt_secret = cfg.security.jwt_secret.trim().to_string();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
