use serde::Serialize;

use crate::{CustomerItem, Error, ResultPage};

pub const SUCCESS_MESSAGE: &str = "Customers fetched successfully.";
pub const FAILURE_MESSAGE: &str = "Failed to fetch customers.";
pub const INTERNAL_ERROR: &str = "Internal server error.";

/// Response body shared by every customer listing outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<'a> {
	pub succeed: bool,
	pub message: &'static str,
	pub page: Option<u32>,
	pub limit: Option<u32>,
	pub total: Option<u64>,
	pub total_pages: Option<u64>,
	pub data: Option<&'a [CustomerItem]>,
	pub error: Option<String>,
}
impl<'a> Envelope<'a> {
	pub fn success(page: &'a ResultPage) -> Self {
		Self {
			succeed: true,
			message: SUCCESS_MESSAGE,
			page: Some(page.page),
			limit: Some(page.limit),
			total: Some(page.total),
			total_pages: Some(page.total_pages),
			data: Some(&page.records),
			error: None,
		}
	}

	/// Record-store details stay in the logs; callers only see a generic message.
	pub fn failure(err: &Error) -> Self {
		let message = match err {
			Error::Authorization(scope) => scope.to_string(),
			Error::RecordStore { .. } => INTERNAL_ERROR.to_string(),
		};

		Self::rejected(message)
	}

	pub fn rejected(error: impl Into<String>) -> Self {
		Self {
			succeed: false,
			message: FAILURE_MESSAGE,
			page: None,
			limit: None,
			total: None,
			total_pages: None,
			data: None,
			error: Some(error.into()),
		}
	}
}
