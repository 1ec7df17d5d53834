//! Write rejection against real storage.

use askdb::db::{DatabaseClient, Value};
use askdb::error::AskError;
use askdb::query::QueryExecutor;

use super::common::{seed, TOTAL_COMPANIES};

const WRITES: &[&str] = &[
    "INSERT INTO companies (\"CompanyName\") VALUES ('EVIL LTD')",
    "UPDATE companies SET \"CompanyStatus\" = 'Dissolved'",
    "DELETE FROM companies",
    "DROP TABLE companies",
    "ALTER TABLE companies ADD COLUMN x TEXT",
    "CREATE TABLE evil (x TEXT)",
    "SELECT 1; DELETE FROM companies",
    "PRAGMA journal_mode = DELETE",
    "ATTACH DATABASE 'evil.db' AS evil",
];

#[tokio::test]
async fn test_executor_rejects_writes() {
    let fixture = seed().await;
    let client = fixture.client().await;
    let executor = QueryExecutor::new(client.clone());

    for sql in WRITES {
        let err = executor.execute_sql(sql, &[]).await.unwrap_err();
        assert!(matches!(err, AskError::Query { .. }), "{sql}");
        assert_eq!(err.sql(), Some(*sql));
    }

    client.close().await;
    assert_eq!(fixture.count_rows().await, TOTAL_COMPANIES);
}

#[tokio::test]
async fn test_storage_connections_are_read_only() {
    let fixture = seed().await;
    let client = fixture.client().await;

    // Straight to storage, skipping the guard
    let err = client
        .execute_query("DELETE FROM companies", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AskError::Query { .. }));

    client.close().await;
    assert_eq!(fixture.count_rows().await, TOTAL_COMPANIES);
}

#[tokio::test]
async fn test_executor_runs_read_only_forms() {
    let fixture = seed().await;
    let executor = QueryExecutor::new(fixture.client().await);

    let result = executor
        .execute_sql(
            "WITH active AS (SELECT * FROM companies WHERE \"CompanyStatus\" = ?) \
             SELECT COUNT(*) FROM active",
            &[Value::from("Active")],
        )
        .await
        .unwrap();
    assert_eq!(result.rows[0][0], Value::Int(21));

    let result = executor.execute_sql("VALUES (1, 'a')", &[]).await.unwrap();
    assert_eq!(result.row_count, 1);
}
