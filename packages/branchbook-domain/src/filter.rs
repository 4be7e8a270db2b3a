use crate::scope::ScopeFilter;

const LIKE_ESCAPE: char = '\\';

/// Case-insensitive literal substring matched against a customer's name or mobile.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchPattern {
	folded: String,
}
impl SearchPattern {
	/// Returns `None` for missing or blank search text.
	pub fn parse(raw: Option<&str>) -> Option<Self> {
		let trimmed = raw?.trim();

		if trimmed.is_empty() {
			return None;
		}

		Some(Self { folded: fold_case(trimmed) })
	}

	pub fn as_str(&self) -> &str {
		&self.folded
	}

	/// `ILIKE` operand with every wildcard escaped, to be used with `ESCAPE '\'`.
	pub fn like_operand(&self) -> String {
		let mut out = String::with_capacity(self.folded.len() + 2);

		out.push('%');

		for ch in self.folded.chars() {
			if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
				out.push(LIKE_ESCAPE);
			}

			out.push(ch);
		}

		out.push('%');

		out
	}

	pub fn matches(&self, value: &str) -> bool {
		fold_case(value).contains(&self.folded)
	}
}

/// Scope plus optional search, with a deterministic textual form used for cache keys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanonicalFilter {
	scope: ScopeFilter,
	search: Option<SearchPattern>,
	encoded: String,
}
impl CanonicalFilter {
	pub fn new(scope: ScopeFilter, search: Option<SearchPattern>) -> Self {
		let encoded = encode(&scope, search.as_ref());

		Self { scope, search, encoded }
	}

	pub fn scope(&self) -> &ScopeFilter {
		&self.scope
	}

	pub fn search(&self) -> Option<&SearchPattern> {
		self.search.as_ref()
	}

	pub fn as_str(&self) -> &str {
		&self.encoded
	}

	pub fn matches(&self, branch_id: &str, name: &str, mobile: &str) -> bool {
		if !self.scope.allows(branch_id) {
			return false;
		}

		match &self.search {
			Some(pattern) => pattern.matches(name) || pattern.matches(mobile),
			None => true,
		}
	}
}

fn encode(scope: &ScopeFilter, search: Option<&SearchPattern>) -> String {
	let mut out = String::from("scope=");

	match scope {
		ScopeFilter::Branch(branch) => {
			out.push_str("eq(");
			push_quoted(&mut out, branch.as_str());
			out.push(')');
		},
		ScopeFilter::Branches(branches) => {
			out.push_str("in(");

			// BTreeSet iteration is ascending, so equal sets encode identically.
			for (i, branch) in branches.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}

				push_quoted(&mut out, branch.as_str());
			}

			out.push(')');
		},
		ScopeFilter::Unrestricted => out.push_str("any()"),
	}

	out.push_str(";search=");

	match search {
		Some(pattern) => {
			out.push_str("contains(");
			push_quoted(&mut out, pattern.as_str());
			out.push(')');
		},
		None => out.push_str("none()"),
	}

	out
}

fn push_quoted(out: &mut String, value: &str) {
	// JSON string quoting keeps separators inside values unambiguous.
	out.push_str(&serde_json::Value::String(value.to_string()).to_string());
}

// Per-character folding, so a letter folds the same wherever it sits in a word.
fn fold_case(value: &str) -> String {
	value.chars().flat_map(char::to_lowercase).collect()
}
