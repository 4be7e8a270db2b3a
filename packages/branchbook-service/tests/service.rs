use std::{sync::Arc, time::Duration};

use time::{OffsetDateTime, macros::datetime};

use branchbook_config::{
	Cache, Config, Pagination, Postgres, Records, Security, Service, Storage,
};
use branchbook_domain::{Identity, ScopeError};
use branchbook_service::{DirectoryService, Envelope, Error, ListCustomersRequest};
use branchbook_storage::models::CustomerRecord;
use branchbook_testkit::{Fault, MemoryCacheStore, MemoryRecordStore, customer};

const BASE: OffsetDateTime = datetime!(2025-01-01 00:00 UTC);

struct Harness {
	service: Arc<DirectoryService>,
	records: Arc<MemoryRecordStore>,
	cache: Arc<MemoryCacheStore>,
}

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:8080".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: "postgres://unused".to_string(), pool_max_conns: 1 },
		},
		cache: Cache {
			enabled: true,
			schema_version: "v1".to_string(),
			ttl_secs: 30,
			timeout_ms: 50,
			max_payload_bytes: None,
			purge_interval_secs: 300,
		},
		records: Records { timeout_ms: 500 },
		pagination: Pagination::default(),
		security: Security { bind_localhost_only: true, jwt_secret: "secret".to_string() },
	}
}

/// Seven customers in B1, five in B2 and five in B3, one minute apart.
fn directory() -> Vec<CustomerRecord> {
	let mut records = Vec::new();
	let mut seq = 0_u128;

	for (branch, rows) in [("B1", 7), ("B2", 5), ("B3", 5)] {
		for _ in 0..rows {
			seq += 1;

			records.push(customer(
				seq,
				branch,
				&format!("Customer {seq}"),
				&format!("0300{seq:07}"),
				BASE + time::Duration::minutes(seq as i64),
			));
		}
	}

	records
}

fn harness_with(cfg: Config, records: MemoryRecordStore) -> Harness {
	let records = Arc::new(records);
	let cache = Arc::new(MemoryCacheStore::new());
	let service = Arc::new(DirectoryService::with_stores(cfg, records.clone(), cache.clone()));

	Harness { service, records, cache }
}

fn harness() -> Harness {
	harness_with(test_config(), MemoryRecordStore::new(directory()))
}

fn user(branch: &str) -> Identity {
	Identity { role: "user".to_string(), own_branch: Some(branch.to_string()), ..Default::default() }
}

fn admin(branches: &[&str]) -> Identity {
	Identity {
		role: "admin".to_string(),
		granted_branches: branches.iter().map(|branch| branch.to_string()).collect(),
		..Default::default()
	}
}

fn super_admin() -> Identity {
	Identity { role: "super_admin".to_string(), ..Default::default() }
}

fn query(search: Option<&str>, page: Option<&str>, limit: Option<&str>) -> ListCustomersRequest {
	ListCustomersRequest {
		search: search.map(str::to_string),
		page: page.map(str::to_string),
		limit: limit.map(str::to_string),
	}
}

#[tokio::test]
async fn admin_sees_first_page_of_granted_branches() {
	let h = harness();
	let page = h
		.service
		.list_customers(&admin(&["B1", "B2"]), query(None, Some("1"), Some("10")))
		.await
		.expect("Listing must succeed.");

	assert_eq!(page.total, 12);
	assert_eq!(page.records.len(), 10);
	assert_eq!(page.total_pages, 2);
	assert!(page.records.iter().all(|item| item.branch_id == "B1" || item.branch_id == "B2"));
	assert!(page.records.windows(2).all(|pair| pair[0].date >= pair[1].date));

	let second = h
		.service
		.list_customers(&admin(&["B2", "B1"]), query(None, Some("2"), Some("10")))
		.await
		.expect("Listing must succeed.");

	assert_eq!(second.records.len(), 2);
}

#[tokio::test]
async fn user_sees_only_own_branch() {
	let h = harness();
	let page = h
		.service
		.list_customers(&user("B3"), ListCustomersRequest::default())
		.await
		.expect("Listing must succeed.");

	assert_eq!(page.total, 5);
	assert!(page.records.iter().all(|item| item.branch_id == "B3"));
}

#[tokio::test]
async fn user_pages_through_own_branch_only() {
	let mut rows = Vec::new();

	for seq in 1..=17_u128 {
		let branch = if seq <= 12 { "B1" } else { "B2" };

		rows.push(customer(
			seq,
			branch,
			&format!("Customer {seq}"),
			&format!("0300{seq:07}"),
			BASE + time::Duration::minutes(seq as i64),
		));
	}

	let h = harness_with(test_config(), MemoryRecordStore::new(rows));
	let page = h
		.service
		.list_customers(&user("B1"), query(None, Some("1"), Some("10")))
		.await
		.expect("Listing must succeed.");

	assert_eq!(page.total, 12);
	assert_eq!(page.records.len(), 10);
	assert_eq!(page.total_pages, 2);
	assert!(page.records.iter().all(|item| item.branch_id == "B1"));
	assert_eq!(page.records[0].name, "Customer 12");

	let second = h
		.service
		.list_customers(&user("B1"), query(None, Some("2"), Some("10")))
		.await
		.expect("Listing must succeed.");

	assert_eq!(second.records.len(), 2);
	assert_eq!(second.records[1].name, "Customer 1");
}

#[tokio::test]
async fn super_admin_sees_every_branch() {
	let h = harness();
	let page = h
		.service
		.list_customers(&super_admin(), query(None, None, Some("50")))
		.await
		.expect("Listing must succeed.");

	assert_eq!(page.total, 17);
	assert_eq!(page.records.len(), 17);
	assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn admin_search_matches_name_or_mobile_within_grants() {
	let records = MemoryRecordStore::new(directory());

	records.insert(customer(100, "B1", "Shop 42", "03110000000", BASE));
	records.insert(customer(101, "B2", "Tailor", "03420000000", BASE));
	records.insert(customer(102, "B3", "42 Mart", "03420000001", BASE));
	records.insert(customer(103, "B1", "Bakery", "03990000000", BASE));

	let h = harness_with(test_config(), records);
	let page = h
		.service
		.list_customers(&admin(&["B1", "B2"]), query(Some("42"), None, None))
		.await
		.expect("Listing must succeed.");
	let mut names: Vec<&str> = page.records.iter().map(|item| item.name.as_str()).collect();

	names.sort_unstable();

	assert_eq!(page.total, 2);
	assert_eq!(names, vec!["Shop 42", "Tailor"]);
}

#[tokio::test]
async fn search_dot_is_literal() {
	let records = MemoryRecordStore::new(Vec::new());

	records.insert(customer(1, "B1", "a.b", "0", BASE));
	records.insert(customer(2, "B1", "axb", "0", BASE));

	let h = harness_with(test_config(), records);
	let page = h
		.service
		.list_customers(&user("B1"), query(Some("a.b"), None, None))
		.await
		.expect("Listing must succeed.");

	assert_eq!(page.total, 1);
	assert_eq!(page.records[0].name, "a.b");
}

#[tokio::test]
async fn admin_without_grants_is_refused_before_any_io() {
	let h = harness();
	let err = h
		.service
		.list_customers(&admin(&[]), ListCustomersRequest::default())
		.await
		.expect_err("Admin without grants must be refused.");

	assert!(matches!(err, Error::Authorization(ScopeError::EmptyScope)));
	assert_eq!(h.records.fetch_calls(), 0);
	assert_eq!(h.records.count_calls(), 0);
	assert_eq!(h.cache.get_calls(), 0);
}

#[tokio::test]
async fn missing_identity_and_unknown_roles_are_refused() {
	let h = harness();
	let missing = h
		.service
		.list_customers(&Identity::default(), ListCustomersRequest::default())
		.await
		.expect_err("Blank role must be refused.");
	let unknown = h
		.service
		.list_customers(
			&Identity { role: "owner".to_string(), ..Default::default() },
			ListCustomersRequest::default(),
		)
		.await
		.expect_err("Unknown role must be refused.");
	let no_branch = h
		.service
		.list_customers(
			&Identity { role: "user".to_string(), ..Default::default() },
			ListCustomersRequest::default(),
		)
		.await
		.expect_err("User without a branch must be refused.");

	assert!(missing.is_unauthenticated());
	assert!(matches!(unknown, Error::Authorization(ScopeError::UnknownRole { .. })));
	assert!(matches!(no_branch, Error::Authorization(ScopeError::MissingScope)));
	assert_eq!(h.records.fetch_calls(), 0);
}

#[tokio::test]
async fn cache_hit_returns_identical_body() {
	let h = harness();
	let identity = admin(&["B1", "B2"]);
	let miss = h
		.service
		.list_customers(&identity, query(Some("  Customer 1 "), None, None))
		.await
		.expect("Listing must succeed.");
	let hit = h
		.service
		.list_customers(&identity, query(Some("customer 1"), None, None))
		.await
		.expect("Listing must succeed.");
	let miss_body = serde_json::to_string(&Envelope::success(&miss)).expect("Serialize.");
	let hit_body = serde_json::to_string(&Envelope::success(&hit)).expect("Serialize.");

	assert_eq!(miss.total, 4);
	assert_eq!(miss_body, hit_body);
	assert_eq!(h.records.fetch_calls(), 1);
	assert_eq!(h.records.count_calls(), 1);
	assert_eq!(h.cache.set_calls(), 1);
	assert_eq!(h.cache.len(), 1);
}

#[tokio::test]
async fn oversized_limits_are_clamped() {
	let h = harness();
	let page = h
		.service
		.list_customers(&super_admin(), query(None, Some("0"), Some("1000")))
		.await
		.expect("Listing must succeed.");

	assert_eq!(page.page, 1);
	assert_eq!(page.limit, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_requests_share_one_query() {
	let records = MemoryRecordStore::new(directory()).with_latency(Duration::from_millis(50));
	let h = harness_with(test_config(), records);
	let mut tasks = Vec::new();

	for _ in 0..16 {
		let service = h.service.clone();

		tasks.push(tokio::spawn(async move {
			service
				.list_customers(&admin(&["B1", "B2"]), ListCustomersRequest::default())
				.await
				.map(|page| page.total)
		}));
	}

	for task in tasks {
		let total = task.await.expect("Task must finish.").expect("Listing must succeed.");

		assert_eq!(total, 12);
	}

	assert_eq!(h.records.fetch_calls(), 1);
	assert_eq!(h.records.count_calls(), 1);
	assert_eq!(h.cache.set_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn results_stay_stale_until_ttl_expires() {
	let h = harness();
	let identity = user("B1");
	let before = h
		.service
		.list_customers(&identity, ListCustomersRequest::default())
		.await
		.expect("Listing must succeed.");

	h.records.insert(customer(500, "B1", "Newcomer", "0", BASE + time::Duration::days(1)));

	let cached = h
		.service
		.list_customers(&identity, ListCustomersRequest::default())
		.await
		.expect("Listing must succeed.");

	assert_eq!(before.total, 7);
	assert_eq!(cached.total, 7);

	tokio::time::advance(Duration::from_secs(31)).await;

	let fresh = h
		.service
		.list_customers(&identity, ListCustomersRequest::default())
		.await
		.expect("Listing must succeed.");

	assert_eq!(fresh.total, 8);
	assert_eq!(fresh.records[0].name, "Newcomer");
	assert_eq!(h.records.fetch_calls(), 2);
}

#[tokio::test]
async fn cache_errors_fall_through_to_the_record_store() {
	let h = harness();

	h.cache.set_fault(Fault::Fail);

	for _ in 0..2 {
		let page = h
			.service
			.list_customers(&user("B2"), ListCustomersRequest::default())
			.await
			.expect("Listing must succeed.");

		assert_eq!(page.total, 5);
	}

	assert_eq!(h.records.fetch_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_cache_times_out_as_a_miss() {
	let h = harness();

	h.cache.set_fault(Fault::Stall);

	let page = h
		.service
		.list_customers(&user("B2"), ListCustomersRequest::default())
		.await
		.expect("Listing must succeed.");

	assert_eq!(page.total, 5);
	assert_eq!(h.records.fetch_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_record_store_fails_the_request() {
	let records = MemoryRecordStore::new(directory()).with_latency(Duration::from_secs(10));
	let h = harness_with(test_config(), records);
	let err = h
		.service
		.list_customers(&user("B1"), ListCustomersRequest::default())
		.await
		.expect_err("Record store timeout must fail the request.");

	assert!(matches!(err, Error::RecordStore { .. }));
	assert_eq!(h.cache.set_calls(), 0);
}

#[tokio::test]
async fn record_store_errors_are_not_cached() {
	let h = harness();

	h.records.set_fault(Fault::Fail);

	let err = h
		.service
		.list_customers(&user("B1"), ListCustomersRequest::default())
		.await
		.expect_err("Record store failure must fail the request.");

	assert!(matches!(err, Error::RecordStore { .. }));
	assert!(h.cache.is_empty());

	h.records.set_fault(Fault::None);

	let page = h
		.service
		.list_customers(&user("B1"), ListCustomersRequest::default())
		.await
		.expect("Listing must recover.");

	assert_eq!(page.total, 7);
}

#[tokio::test]
async fn disabled_cache_is_never_touched() {
	let mut cfg = test_config();

	cfg.cache.enabled = false;

	let h = harness_with(cfg, MemoryRecordStore::new(directory()));

	for _ in 0..2 {
		h.service
			.list_customers(&user("B1"), ListCustomersRequest::default())
			.await
			.expect("Listing must succeed.");
	}

	assert_eq!(h.cache.get_calls(), 0);
	assert_eq!(h.cache.set_calls(), 0);
	assert_eq!(h.records.fetch_calls(), 2);
}

#[tokio::test]
async fn oversized_payloads_are_served_but_not_stored() {
	let mut cfg = test_config();

	cfg.cache.max_payload_bytes = Some(16);

	let h = harness_with(cfg, MemoryRecordStore::new(directory()));
	let page = h
		.service
		.list_customers(&user("B1"), ListCustomersRequest::default())
		.await
		.expect("Listing must succeed.");

	assert_eq!(page.total, 7);
	assert_eq!(h.cache.set_calls(), 0);
}
