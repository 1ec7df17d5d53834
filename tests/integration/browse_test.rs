//! Table browsing, schema dump, and health.

use askdb::engine::PageRequest;
use askdb::error::AskError;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::common::{seed, TOTAL_COMPANIES};

#[tokio::test]
async fn test_list_and_describe_tables() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    assert_eq!(engine.list_tables().await.unwrap(), vec!["big", "companies"]);

    let columns = engine.describe_table("companies").await.unwrap();
    assert_eq!(columns.len(), 7);
    assert_eq!(
        serde_json::to_value(&columns[1]).unwrap(),
        json!({"name": " CompanyNumber", "type": "TEXT"})
    );

    let err = engine.describe_table("people").await.unwrap_err();
    assert!(matches!(err, AskError::NotFound(_)));
}

#[tokio::test]
async fn test_read_table_data_pages() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let page = PageRequest {
        limit: 2,
        offset: 25,
        columns: Some(vec!["CompanyName".into(), " CompanyNumber".into()]),
        filter: None,
    };
    let data = engine.read_table_data("companies", &page).await.unwrap();

    // Only TESCO PLC sits past offset 25
    assert_eq!(
        serde_json::to_value(&data).unwrap(),
        json!({
            "data": [{"CompanyName": "TESCO PLC", " CompanyNumber": "00445790"}],
            "limit": 2,
            "offset": 25
        })
    );
}

#[tokio::test]
async fn test_read_table_data_filter() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let page = PageRequest {
        limit: 100,
        filter: Some("\"CompanyStatus\" = 'Dissolved'".into()),
        ..Default::default()
    };
    let data = engine.read_table_data("companies", &page).await.unwrap();
    assert_eq!(data.data.len(), 5);
    assert!(data
        .data
        .iter()
        .all(|row| row["CompanyStatus"] == json!("Dissolved")));
}

#[tokio::test]
async fn test_read_table_data_filter_cannot_write() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let page = PageRequest {
        filter: Some("1 = 1); DELETE FROM companies; --".into()),
        ..Default::default()
    };
    let err = engine.read_table_data("companies", &page).await.unwrap_err();
    assert!(matches!(err, AskError::Query { .. }));

    engine.close().await;
    assert_eq!(fixture.count_rows().await, TOTAL_COMPANIES);
}

#[tokio::test]
async fn test_read_table_data_rejects_bad_arguments() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let too_big = PageRequest {
        limit: 101,
        ..Default::default()
    };
    assert!(matches!(
        engine.read_table_data("companies", &too_big).await,
        Err(AskError::Validation(_))
    ));

    let trimmed_name = PageRequest {
        columns: Some(vec!["CompanyNumber".into()]),
        ..Default::default()
    };
    assert!(matches!(
        engine.read_table_data("companies", &trimmed_name).await,
        Err(AskError::Validation(_))
    ));

    assert!(matches!(
        engine.read_table_data("people", &PageRequest::default()).await,
        Err(AskError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_schema_dump() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let dump = serde_json::to_value(engine.schema().await.unwrap()).unwrap();
    assert_eq!(dump["llm_available"], json!(false));
    assert_eq!(dump["schema"]["table"], json!("companies"));
    assert_eq!(dump["schema"]["columns"][1]["name"], json!(" CompanyNumber"));
    assert_eq!(dump["schema"]["sample_data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_health() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let health = serde_json::to_value(engine.health().await.unwrap()).unwrap();
    assert_eq!(
        health,
        json!({
            "status": "healthy",
            "database": "connected",
            "total_rows": TOTAL_COMPANIES,
            "llm_available": false
        })
    );
}
