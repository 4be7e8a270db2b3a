use axum::http::{HeaderMap, header::AUTHORIZATION};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use branchbook_domain::Identity;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("Unauthorized")]
	MissingToken,
	#[error("Invalid token")]
	InvalidToken(#[source] jsonwebtoken::errors::Error),
}

/// Claims minted by the sign-in flow.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
	#[serde(default)]
	pub user_id: Option<String>,
	#[serde(default)]
	pub role: String,
	#[serde(default)]
	pub branch_id: Option<String>,
	#[serde(default)]
	pub branches: Option<Vec<String>>,
	pub exp: u64,
}
impl Claims {
	pub fn into_identity(self) -> Identity {
		Identity {
			role: self.role,
			own_branch: self.branch_id,
			granted_branches: self.branches.unwrap_or_default(),
		}
	}
}

/// HS256 bearer-token verifier.
pub struct TokenVerifier {
	key: DecodingKey,
	validation: Validation,
}
impl TokenVerifier {
	pub fn new(secret: &str) -> Self {
		Self {
			key: DecodingKey::from_secret(secret.as_bytes()),
			validation: Validation::new(Algorithm::HS256),
		}
	}

	pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
		jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
			.map(|data| data.claims)
			.map_err(AuthError::InvalidToken)
	}

	pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
		let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;

		self.verify(token)
	}
}

/// Second word of the `Authorization` header, whatever the scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let (_, token) = raw.trim().split_once(' ')?;
	let token = token.trim();

	if token.is_empty() { None } else { Some(token) }
}
