pub mod memory;

mod error;

pub use error::{Error, Result};
pub use memory::{Fault, MemoryCacheStore, MemoryRecordStore, customer};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor, PgPool,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use branchbook_storage::models::CustomerRecord;

const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];
const CUSTOMERS_DDL: &str = "\
CREATE TABLE IF NOT EXISTS customers (
	id uuid PRIMARY KEY,
	name text NOT NULL,
	mobile text NOT NULL,
	comment text NOT NULL DEFAULT '',
	branch_id text NOT NULL,
	created_at timestamptz NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_customers_branch_created
	ON customers (branch_id, created_at DESC)";

/// A throwaway database created next to `BRANCHBOOK_PG_DSN`; dropped on cleanup or drop.
pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Invalid BRANCHBOOK_PG_DSN: {err}.")))?;
		let (maintenance, mut conn) = connect_maintenance(&base).await?;
		let name = format!("branchbook_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.maintenance).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = std::mem::take(&mut self.name);
		let maintenance = self.maintenance.clone();
		// The caller's runtime may be shutting down, so drop from a private one.
		let handle = thread::spawn(move || {
			let result = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| Error::Message(err.to_string()))
				.and_then(|runtime| runtime.block_on(drop_database(&name, &maintenance)));

			if let Err(err) = result {
				eprintln!("Failed to drop test database {name}: {err}.");
			}
		});
		let _ = handle.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var("BRANCHBOOK_PG_DSN").ok()
}

/// Creates the `customers` table the directory reads from.
pub async fn create_customers_table(pool: &PgPool) -> Result<()> {
	for statement in CUSTOMERS_DDL.split(';') {
		let statement = statement.trim();

		if statement.is_empty() {
			continue;
		}

		sqlx::query(statement).execute(pool).await?;
	}

	Ok(())
}

pub async fn insert_customer(pool: &PgPool, record: &CustomerRecord) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO customers (id, name, mobile, comment, branch_id, created_at)
VALUES ($1, $2, $3, $4, $5, $6)",
	)
	.bind(record.id)
	.bind(&record.name)
	.bind(&record.mobile)
	.bind(&record.comment)
	.bind(&record.branch_id)
	.bind(record.created_at)
	.execute(pool)
	.await?;

	Ok(())
}

async fn connect_maintenance(
	base: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut errors = Vec::new();

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => errors.push(format!("{database}: {err}")),
		}
	}

	Err(Error::Message(format!("No maintenance database reachable ({}).", errors.join("; "))))
}

async fn drop_database(name: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	// Pooled connections from the test keep the database busy until terminated.
	sqlx::query("SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1")
		.bind(name)
		.execute(&mut conn)
		.await?;
	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str()).await?;

	Ok(())
}
