use sqlx::{PgPool, Postgres, QueryBuilder};

use branchbook_domain::{CanonicalFilter, PageRequest, ScopeFilter};

use crate::{BoxFuture, Error, RecordStore, Result, models::CustomerRecord};

#[derive(Clone)]
pub struct PgRecordStore {
	pool: PgPool,
}
impl PgRecordStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}
impl RecordStore for PgRecordStore {
	fn fetch_page<'a>(
		&'a self,
		filter: &'a CanonicalFilter,
		page: PageRequest,
	) -> BoxFuture<'a, Result<Vec<CustomerRecord>>> {
		Box::pin(fetch_page(&self.pool, filter, page))
	}

	fn count<'a>(&'a self, filter: &'a CanonicalFilter) -> BoxFuture<'a, Result<u64>> {
		Box::pin(count(&self.pool, filter))
	}
}

pub async fn fetch_page(
	pool: &PgPool,
	filter: &CanonicalFilter,
	page: PageRequest,
) -> Result<Vec<CustomerRecord>> {
	let offset = i64::try_from(page.skip())
		.map_err(|_| Error::InvalidArgument("Page offset is out of range.".to_string()))?;
	let mut builder = QueryBuilder::<Postgres>::new(
		"SELECT id, name, mobile, comment, branch_id, created_at FROM customers WHERE TRUE",
	);

	push_filter(&mut builder, filter);

	builder.push(" ORDER BY created_at DESC, id ASC LIMIT ");
	builder.push_bind(i64::from(page.limit()));
	builder.push(" OFFSET ");
	builder.push_bind(offset);

	let records = builder.build_query_as::<CustomerRecord>().fetch_all(pool).await?;

	Ok(records)
}

pub async fn count(pool: &PgPool, filter: &CanonicalFilter) -> Result<u64> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT count(*) FROM customers WHERE TRUE");

	push_filter(&mut builder, filter);

	let total: i64 = builder.build_query_scalar().fetch_one(pool).await?;

	u64::try_from(total)
		.map_err(|_| Error::InvalidArgument("Customer count is negative.".to_string()))
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CanonicalFilter) {
	match filter.scope() {
		ScopeFilter::Branch(branch) => {
			builder.push(" AND branch_id = ");
			builder.push_bind(branch.as_str().to_string());
		},
		ScopeFilter::Branches(branches) => {
			let ids: Vec<String> = branches.iter().map(|branch| branch.as_str().to_string()).collect();

			builder.push(" AND branch_id = ANY(");
			builder.push_bind(ids);
			builder.push(")");
		},
		ScopeFilter::Unrestricted => {},
	}

	if let Some(pattern) = filter.search() {
		let operand = pattern.like_operand();

		builder.push(" AND (name ILIKE ");
		builder.push_bind(operand.clone());
		builder.push(" ESCAPE '\\' OR mobile ILIKE ");
		builder.push_bind(operand);
		builder.push(" ESCAPE '\\')");
	}
}
