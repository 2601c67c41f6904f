//! Round trip against a live PostgreSQL server.
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test postgres_test -- --ignored

use serde_json::json;
use sql_agent::config::DatabaseConfig;
use sql_agent::db::init_pool;
use sql_agent::{
    Catalog, ExecutionOutcome, PgDatabase, QueryExecutor, QueryValidator, SchemaProvider,
    ValidationOutcome,
};
use std::sync::Arc;

async fn connect() -> Arc<PgDatabase> {
    dotenv::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    let pool = init_pool(&DatabaseConfig {
        url,
        max_connections: 1,
        read_only: true,
        statement_timeout_ms: Some(10_000),
    })
    .await
    .expect("connect");
    Arc::new(PgDatabase::new(pool))
}

#[tokio::test]
#[ignore]
async fn plan_check_and_execution_against_postgres() {
    let db = connect().await;

    let validator = QueryValidator::new(db.clone());
    let sql = "SELECT 1 AS one, 'a'::text AS letter, NULL::int AS nothing";
    assert_eq!(
        validator.validate(sql).await,
        ValidationOutcome::Accepted(sql.to_string())
    );
    assert!(matches!(
        validator.validate("SELEC 1").await,
        ValidationOutcome::Rejected(_)
    ));
    assert!(matches!(validator.validate("").await, ValidationOutcome::Rejected(_)));

    let executor = QueryExecutor::new(db.clone());
    match executor.run(sql).await {
        ExecutionOutcome::Rows(table) => {
            assert_eq!(table.columns, vec!["one", "letter", "nothing"]);
            assert_eq!(table.rows, vec![vec![json!(1), json!("a"), json!(null)]]);
        }
        other => panic!("expected rows, got {:?}", other),
    }
    assert_eq!(
        executor.run("SELECT 1 WHERE false").await,
        ExecutionOutcome::Empty
    );
    assert!(matches!(
        executor.run("SELECT * FROM definitely_missing_table").await,
        ExecutionOutcome::Failure(msg) if msg.starts_with("Erro no PostgreSQL:")
    ));
}

#[tokio::test]
#[ignore]
async fn read_only_session_refuses_writes() {
    let db = connect().await;
    let executor = QueryExecutor::new(db);
    assert!(matches!(
        executor.run("CREATE TEMP TABLE scratch (id int)").await,
        ExecutionOutcome::Failure(_)
    ));
}

#[tokio::test]
#[ignore]
async fn catalog_lists_public_tables() {
    let db = connect().await;
    let tables = db.list_tables("public").await.expect("list tables");
    let schema = SchemaProvider::new(db, "public").fetch_schema().await;
    for table in tables {
        assert!(schema.contains(&format!("Table: {}\n", table)));
    }
}

async fn single_row(db: Arc<PgDatabase>, sql: &str) -> Vec<serde_json::Value> {
    match QueryExecutor::new(db).run(sql).await {
        ExecutionOutcome::Rows(mut table) => table.rows.remove(0),
        other => panic!("expected rows for {}, got {:?}", sql, other),
    }
}

#[tokio::test]
#[ignore]
async fn numeric_values_keep_exact_text() {
    let db = connect().await;

    let row = single_row(
        db.clone(),
        "SELECT sum(x) AS total FROM (VALUES (99999999999999999999999999999::numeric), (1)) t(x)",
    )
    .await;
    assert_eq!(row, vec![json!("100000000000000000000000000000")]);

    let row = single_row(
        db.clone(),
        "SELECT 1234567890.12345678901234567890::numeric, 0.0000001::numeric, 2.50::numeric",
    )
    .await;
    assert_eq!(
        row,
        vec![
            json!("1234567890.12345678901234567890"),
            json!("0.0000001"),
            json!("2.50")
        ]
    );

    let row = single_row(db, "SELECT 'NaN'::numeric, sum(x) FROM (VALUES (1::bigint), (2)) t(x)").await;
    assert_eq!(row, vec![json!("NaN"), json!("3")]);
}

#[tokio::test]
#[ignore]
async fn scalar_types_are_decoded() {
    let db = connect().await;
    let row = single_row(
        db,
        "SELECT true, DATE '2024-02-29', TIMESTAMPTZ '2024-01-02 03:04:05+00', \
         'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11'::uuid, '{\"k\": [1, 2]}'::jsonb, \
         interval '1 day', interval '1 year 2 months 03:04:05.5', '\\xdead'::bytea",
    )
    .await;
    assert_eq!(
        row,
        vec![
            json!(true),
            json!("2024-02-29"),
            json!("2024-01-02T03:04:05+00:00"),
            json!("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11"),
            json!({"k": [1, 2]}),
            json!("1 day"),
            json!("1 year 2 mons 03:04:05.5"),
            json!("\\xdead"),
        ]
    );
}

#[tokio::test]
#[ignore]
async fn arrays_are_decoded_with_nulls() {
    let db = connect().await;
    let row = single_row(
        db.clone(),
        "SELECT array_agg(x ORDER BY x) FROM (VALUES ('a'), ('b')) t(x)",
    )
    .await;
    assert_eq!(row, vec![json!(["a", "b"])]);

    let row = single_row(
        db,
        "SELECT ARRAY[1, NULL, 3]::int8[], ARRAY[1.5, 2.25]::float8[], ARRAY[true, false]",
    )
    .await;
    assert_eq!(
        row,
        vec![json!([1, null, 3]), json!([1.5, 2.25]), json!([true, false])]
    );
}

#[tokio::test]
#[ignore]
async fn undecodable_cell_keeps_the_rest_of_the_row() {
    let db = connect().await;
    let row = single_row(db, "SELECT 1 AS id, ARRAY[point(1,2)] AS shapes, 'kept' AS label").await;
    assert_eq!(row[0], json!(1));
    assert_eq!(row[1], json!("<point[]>"));
    assert_eq!(row[2], json!("kept"));
}
