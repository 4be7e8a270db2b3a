use branchbook_domain::ScopeError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Authorization(#[from] ScopeError),
	#[error("Record store error: {message}")]
	RecordStore { message: String },
}
impl Error {
	/// The caller could not be identified at all, as opposed to being identified and refused.
	pub fn is_unauthenticated(&self) -> bool {
		matches!(self, Self::Authorization(ScopeError::MissingIdentity))
	}
}
