use std::sync::Arc;

use branchbook_service::DirectoryService;
use branchbook_storage::db::Db;

use crate::auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DirectoryService>,
	pub verifier: Arc<TokenVerifier>,
}
impl AppState {
	pub fn new(config: branchbook_config::Config, db: &Db) -> Self {
		Self::from_service(DirectoryService::new(config, db))
	}

	/// Builds the state around an existing service, reusing its JWT secret.
	pub fn from_service(service: DirectoryService) -> Self {
		let verifier = TokenVerifier::new(&service.cfg.security.jwt_secret);

		Self { service: Arc::new(service), verifier: Arc::new(verifier) }
	}
}
