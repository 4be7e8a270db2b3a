use std::fmt;

use crate::{filter::CanonicalFilter, page::PageRequest, scope::Role};

const FINGERPRINT_LEN: usize = 12;

/// `version:role:canonicalFilter:page:limit`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey(String);
impl CacheKey {
	pub fn encode(version: &str, role: Role, filter: &CanonicalFilter, page: PageRequest) -> Self {
		Self(format!(
			"{version}:{role}:{filter}:{page}:{limit}",
			role = role.as_str(),
			filter = filter.as_str(),
			page = page.page(),
			limit = page.limit(),
		))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Short digest safe to log; the key itself carries search text.
	pub fn fingerprint(&self) -> String {
		let mut hex = blake3::hash(self.0.as_bytes()).to_hex().to_string();

		hex.truncate(FINGERPRINT_LEN);

		hex
	}
}
impl fmt::Display for CacheKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
