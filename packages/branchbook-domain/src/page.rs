pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PageRequest {
	page: u32,
	limit: u32,
}
impl PageRequest {
	/// Parses raw query values. Missing, non-numeric, or non-positive values fall back to the
	/// defaults; limits above `max_limit` are clamped.
	pub fn parse(page: Option<&str>, limit: Option<&str>, max_limit: u32) -> Self {
		let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
		let limit = parse_positive(limit).unwrap_or(DEFAULT_LIMIT).min(max_limit.max(1));

		Self { page, limit }
	}

	pub fn new(page: u32, limit: u32) -> Self {
		Self { page: page.max(1), limit: limit.max(1) }
	}

	pub fn page(&self) -> u32 {
		self.page
	}

	pub fn limit(&self) -> u32 {
		self.limit
	}

	pub fn skip(&self) -> u64 {
		u64::from(self.page - 1) * u64::from(self.limit)
	}
}
impl Default for PageRequest {
	fn default() -> Self {
		Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
	}
}

pub fn total_pages(total: u64, limit: u32) -> u64 {
	if total == 0 || limit == 0 {
		return 0;
	}

	total.div_ceil(u64::from(limit))
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
	let value: i64 = raw?.trim().parse().ok()?;

	if value < 1 {
		return None;
	}

	Some(u32::try_from(value).unwrap_or(u32::MAX))
}
