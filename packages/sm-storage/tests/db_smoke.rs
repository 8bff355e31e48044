use time::macros::{date, datetime};
use uuid::Uuid;

use sm_config::Postgres;
use sm_storage::{db::Db, models::NeedRecord, queries};
use sm_testkit::TestDatabase;

async fn insert_person(db: &Db, person_id: &str, handle: &str, enabled: bool) {
	sqlx::query(
		"INSERT INTO people (person_id, display_name, external_handle, enabled, expertise) \
		 VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(person_id)
	.bind(format!("Person {person_id}"))
	.bind(handle)
	.bind(enabled)
	.bind("Frontend testing")
	.execute(&db.pool)
	.await
	.expect("Failed to insert person.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SM_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = sm_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set SM_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(3).await.expect("Failed to ensure schema.");
	// Bootstrapping twice must be a no-op.
	db.ensure_schema(3).await.expect("Failed to re-run schema.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'person_skills'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SM_PG_DSN to run."]
async fn skill_vector_query_skips_disabled_people() {
	let Some(base_dsn) = sm_testkit::env_dsn() else {
		eprintln!("Skipping skill_vector_query_skips_disabled_people; set SM_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(3).await.expect("Failed to ensure schema.");

	insert_person(&db, "P1", "alice", true).await;
	insert_person(&db, "P2", "bob", false).await;

	let react = queries::upsert_skill(&db.pool, "React.js", &[1.0, 0.0, 0.0])
		.await
		.expect("Failed to upsert skill.");
	let again = queries::upsert_skill(&db.pool, "react.js", &[0.0, 1.0, 0.0])
		.await
		.expect("Failed to upsert skill.");

	assert_eq!(react, again, "Skill identity must be case-insensitive.");

	assert!(queries::assign_person_skill(&db.pool, "P1", react).await.expect("assign failed"));
	assert!(!queries::assign_person_skill(&db.pool, "P1", react).await.expect("assign failed"));
	assert!(queries::assign_person_skill(&db.pool, "P2", react).await.expect("assign failed"));

	let rows = queries::query_by_skill_vector(&db, &[1.0, 0.0, 0.0], 10)
		.await
		.expect("Failed to query skills.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].person_id, "P1");
	assert_eq!(rows[0].skill, "React.js");
	assert!((rows[0].score - 1.0).abs() < 1e-5);

	let skills = queries::full_skill_list(&db, "P1").await.expect("Failed to list skills.");

	assert_eq!(skills, vec!["React.js".to_string()]);

	let enabled = queries::count_enabled_with_skills(&db).await.expect("Failed to count people.");

	assert_eq!(enabled, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SM_PG_DSN to run."]
async fn needs_are_counted_by_week() {
	let Some(base_dsn) = sm_testkit::env_dsn() else {
		eprintln!("Skipping needs_are_counted_by_week; set SM_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(3).await.expect("Failed to ensure schema.");

	for (week_start, created_at) in [
		(date!(2024 - 06 - 03), datetime!(2024-06-05 10:00 UTC)),
		(date!(2024 - 06 - 10), datetime!(2024-06-11 10:00 UTC)),
		(date!(2024 - 06 - 10), datetime!(2024-06-12 10:00 UTC)),
	] {
		let need = NeedRecord {
			need_id: Uuid::new_v4(),
			requester_id: "U1".to_string(),
			text: "Need help with React testing".to_string(),
			embedding: vec![0.1, 0.2, 0.3],
			week_start,
			created_at,
		};

		queries::insert_need(&db, &need).await.expect("Failed to insert need.");
	}

	let count =
		queries::count_needs_since(&db, date!(2024 - 06 - 10)).await.expect("Failed to count.");

	assert_eq!(count, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SM_PG_DSN to run."]
async fn channel_context_is_bounded_per_person() {
	let Some(base_dsn) = sm_testkit::env_dsn() else {
		eprintln!("Skipping channel_context_is_bounded_per_person; set SM_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(3).await.expect("Failed to ensure schema.");

	insert_person(&db, "P1", "alice", true).await;
	insert_person(&db, "P2", "bob", true).await;

	// P1 sits in three "a-*" channels; P2 only in a channel that sorts last.
	for (channel_id, name, members) in [
		("C1", "a-frontend", vec!["P1"]),
		("C2", "a-testing", vec!["P1"]),
		("C3", "a-design", vec!["P1"]),
		("C4", "z-infra", vec!["P1", "P2"]),
	] {
		sqlx::query("INSERT INTO channels (channel_id, name, summary) VALUES ($1, $2, NULL)")
			.bind(channel_id)
			.bind(name)
			.execute(&db.pool)
			.await
			.expect("Failed to insert channel.");

		for member in members {
			sqlx::query("INSERT INTO channel_members (channel_id, person_id) VALUES ($1, $2)")
				.bind(channel_id)
				.bind(member)
				.execute(&db.pool)
				.await
				.expect("Failed to insert channel member.");
		}
	}

	let people = vec!["P1".to_string(), "P2".to_string()];
	let rows = queries::channel_context(&db, &people, 2).await.expect("Failed to load channels.");
	let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();

	assert_eq!(names, vec!["a-design", "a-frontend", "z-infra"]);
	assert_eq!(rows[2].members, vec!["P1".to_string(), "P2".to_string()]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
