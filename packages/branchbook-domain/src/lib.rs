pub mod cache_key;
pub mod filter;
pub mod page;
pub mod scope;

pub use cache_key::CacheKey;
pub use filter::{CanonicalFilter, SearchPattern};
pub use page::{DEFAULT_LIMIT, DEFAULT_PAGE, PageRequest, total_pages};
pub use scope::{BranchId, Identity, ResolvedScope, Role, ScopeError, ScopeFilter, resolve};
