use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// Caller context produced by the token verifier. Values are taken verbatim from the claims
/// and only become typed in [`resolve`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Identity {
	pub role: String,
	pub own_branch: Option<String>,
	#[serde(default)]
	pub granted_branches: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Role {
	User,
	Admin,
	SuperAdmin,
}
impl Role {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"user" => Some(Self::User),
			"admin" => Some(Self::Admin),
			// User documents spell it `superAdmin`; tokens spell it `super_admin`.
			"super_admin" | "superAdmin" => Some(Self::SuperAdmin),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Admin => "admin",
			Self::SuperAdmin => "super_admin",
		}
	}
}
impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BranchId(String);
impl BranchId {
	pub fn parse(raw: &str) -> Option<Self> {
		let trimmed = raw.trim();

		if trimmed.is_empty() {
			return None;
		}

		Some(Self(trimmed.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl fmt::Display for BranchId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScopeFilter {
	Branch(BranchId),
	Branches(BTreeSet<BranchId>),
	Unrestricted,
}
impl ScopeFilter {
	pub fn allows(&self, branch_id: &str) -> bool {
		match self {
			Self::Branch(branch) => branch.as_str() == branch_id,
			Self::Branches(branches) => branches.iter().any(|branch| branch.as_str() == branch_id),
			Self::Unrestricted => true,
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedScope {
	pub role: Role,
	pub filter: ScopeFilter,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ScopeError {
	#[error("Identity is missing.")]
	MissingIdentity,
	#[error("User has no branch assigned.")]
	MissingScope,
	#[error("Admin has no branches granted.")]
	EmptyScope,
	#[error("Role {role:?} is not recognized.")]
	UnknownRole { role: String },
}

pub fn resolve(identity: &Identity) -> Result<ResolvedScope, ScopeError> {
	let raw_role = identity.role.trim();

	if raw_role.is_empty() {
		return Err(ScopeError::MissingIdentity);
	}

	let Some(role) = Role::parse(raw_role) else {
		return Err(ScopeError::UnknownRole { role: raw_role.to_string() });
	};
	let filter = match role {
		Role::User => {
			let branch = identity
				.own_branch
				.as_deref()
				.and_then(BranchId::parse)
				.ok_or(ScopeError::MissingScope)?;

			ScopeFilter::Branch(branch)
		},
		Role::Admin => {
			let branches: BTreeSet<BranchId> =
				identity.granted_branches.iter().filter_map(|raw| BranchId::parse(raw)).collect();

			if branches.is_empty() {
				return Err(ScopeError::EmptyScope);
			}

			ScopeFilter::Branches(branches)
		},
		Role::SuperAdmin => ScopeFilter::Unrestricted,
	};

	Ok(ResolvedScope { role, filter })
}
