//! SQLite client behaviour.

use askdb::config::DatabaseConfig;
use askdb::db::{DatabaseClient, SqliteClient, Value, MAX_ROWS};
use askdb::error::AskError;
use pretty_assertions::assert_eq;

use super::common::seed;

#[tokio::test]
async fn test_list_tables_excludes_internal() {
    let fixture = seed().await;
    let client = fixture.client().await;

    assert_eq!(client.list_tables().await.unwrap(), vec!["big", "companies"]);
}

#[tokio::test]
async fn test_columns_keep_stored_spelling() {
    let fixture = seed().await;
    let client = fixture.client().await;

    let columns = client.table_columns("companies").await.unwrap();
    let names = columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "CompanyName",
            " CompanyNumber",
            "CompanyCategory",
            "CompanyStatus",
            "DissolutionDate",
            "IncorporationDate",
            "Accounts.AccountCategory",
        ]
    );
    assert_eq!(columns[0].data_type, "TEXT");

    assert!(client.table_columns("nope").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_row_result_keeps_columns() {
    let fixture = seed().await;
    let client = fixture.client().await;

    let result = client
        .execute_query(
            "SELECT \"CompanyName\", \" CompanyNumber\" FROM companies WHERE 1 = 0",
            &[],
        )
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.column_names(), vec!["CompanyName", " CompanyNumber"]);
}

#[tokio::test]
async fn test_results_are_truncated_at_ceiling() {
    let fixture = seed().await;
    let client = fixture.client().await;

    let result = client.execute_query("SELECT i FROM big", &[]).await.unwrap();
    assert_eq!(result.row_count, MAX_ROWS);
    assert!(result.was_truncated);
    assert!(result.truncation_warning().is_some());

    let result = client
        .execute_query("SELECT i FROM big LIMIT ?", &[Value::Int(5)])
        .await
        .unwrap();
    assert_eq!(result.row_count, 5);
    assert!(!result.was_truncated);
}

#[tokio::test]
async fn test_null_and_typed_values() {
    let fixture = seed().await;
    let client = fixture.client().await;

    let result = client
        .execute_query(
            "SELECT \"DissolutionDate\", 42, 1.5 FROM companies WHERE \"CompanyName\" = ?",
            &[Value::from("TESCO PLC")],
        )
        .await
        .unwrap();

    assert_eq!(
        result.rows,
        vec![vec![Value::Null, Value::Int(42), Value::Float(1.5)]]
    );
}

#[tokio::test]
async fn test_storage_error_carries_sql() {
    let fixture = seed().await;
    let client = fixture.client().await;

    let err = client
        .execute_query("SELECT nope FROM companies", &[])
        .await
        .unwrap_err();
    assert_eq!(err.sql(), Some("SELECT nope FROM companies"));
    assert!(err.message().contains("nope"));
}

#[tokio::test]
async fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("missing.db"),
        ..Default::default()
    };

    let err = SqliteClient::open(&config).await.unwrap_err();
    assert!(matches!(err, AskError::DataUnavailable(_)));
    // Opening never creates the file
    assert!(!config.path.exists());
}
