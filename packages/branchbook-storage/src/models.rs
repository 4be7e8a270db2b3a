use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct CustomerRecord {
	pub id: Uuid,
	pub name: String,
	pub mobile: String,
	pub comment: String,
	pub branch_id: String,
	pub created_at: OffsetDateTime,
}
