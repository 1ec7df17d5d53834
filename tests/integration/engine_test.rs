//! End-to-end question answering against a seeded database.

use askdb::db::Value;
use askdb::engine::Engine;
use askdb::error::AskError;
use askdb::llm::{FailingLlmClient, MockLlmClient};
use askdb::present::{Channel, Payload, ResultPresenter};
use askdb::resolve::Provenance;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

use super::common::{seed, ACTIVE_COMPANIES, TOTAL_COMPANIES};

fn all_equal(values: Option<Vec<&Value>>, expected: &str) -> bool {
    let values = values.expect("column present");
    !values.is_empty() && values.iter().all(|v| v.as_str() == Some(expected))
}

#[tokio::test]
async fn test_list_companies() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("list companies").await.unwrap();
    assert_eq!(
        answer.result.column_names(),
        vec!["CompanyName", " CompanyNumber", "CompanyStatus"]
    );
    assert_eq!(answer.result.row_count, 10);
    assert_eq!(answer.query.provenance, Provenance::Rule);
}

#[tokio::test]
async fn test_count_companies() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("count companies").await.unwrap();
    assert!(answer.query.aggregate);
    assert_eq!(answer.result.column_names(), vec!["total_companies"]);
    assert_eq!(answer.result.rows, vec![vec![Value::Int(TOTAL_COMPANIES)]]);
}

#[tokio::test]
async fn test_active_companies() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("active companies").await.unwrap();
    assert_eq!(answer.result.row_count, 10);
    assert!(all_equal(answer.result.column_values("CompanyStatus"), "Active"));
}

#[tokio::test]
async fn test_micro_entity_companies() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("micro entity companies").await.unwrap();
    assert_eq!(answer.result.row_count, 7);
    assert!(all_equal(
        answer.result.column_values("Accounts.AccountCategory"),
        "MICRO ENTITY"
    ));
}

#[tokio::test]
async fn test_unrecognized_question_lists() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("xyzzy").await.unwrap();
    assert!(answer.result.row_count <= 10);
    assert!(!answer.result.is_empty());
}

#[tokio::test]
async fn test_dissolved_companies_show_dissolution_date() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("dissolved companies").await.unwrap();
    assert_eq!(answer.result.row_count, 5);
    assert!(all_equal(
        answer.result.column_values("DissolutionDate"),
        "01/01/2020"
    ));
}

#[tokio::test]
async fn test_explicit_limit_overrides_cap() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("show 50 active companies").await.unwrap();
    assert_eq!(answer.result.row_count, ACTIVE_COMPANIES);

    let answer = engine.ask("top 3 companies").await.unwrap();
    assert_eq!(answer.result.row_count, 3);
}

#[tokio::test]
async fn test_category_filter() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("private limited companies").await.unwrap();
    assert_eq!(answer.result.row_count, 9);
    assert!(all_equal(
        answer.result.column_values("CompanyCategory"),
        "Private Limited Company"
    ));
}

#[tokio::test]
async fn test_name_search() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine.ask("company named Tesco").await.unwrap();
    assert_eq!(answer.result.row_count, 1);
    assert_eq!(
        answer.result.column_values(" CompanyNumber").unwrap(),
        vec![&Value::from("00445790")]
    );
}

#[tokio::test]
async fn test_injection_is_only_a_name_filter() {
    let fixture = seed().await;
    let engine = fixture.engine().await;

    let answer = engine
        .ask(r#"company named Foo"; DROP TABLE companies;--"#)
        .await
        .unwrap();

    assert!(!answer.query.sql.contains("DROP"));
    assert_eq!(answer.query.params[0], Value::from("%Foo%"));
    assert!(answer.result.is_empty());

    engine.close().await;
    assert_eq!(fixture.count_rows().await, TOTAL_COMPANIES);
}

#[tokio::test]
async fn test_model_answer_is_executed() {
    let fixture = seed().await;
    let client = MockLlmClient::new().with_response(
        "tesco",
        "```sql\nSELECT \"CompanyName\", \" CompanyNumber\" FROM companies WHERE \"CompanyName\" = 'TESCO PLC'\n```",
    );
    let engine = Engine::with_client(
        fixture.client().await,
        &fixture.config(),
        Some(Arc::new(client)),
    )
    .await
    .unwrap();

    let answer = engine.ask("what is tesco's number").await.unwrap();
    assert_eq!(answer.query.provenance, Provenance::Model);
    assert_eq!(
        answer.result.rows,
        vec![vec![Value::from("TESCO PLC"), Value::from("00445790")]]
    );
}

#[tokio::test]
async fn test_model_failure_falls_back_to_rules() {
    let fixture = seed().await;
    let engine = Engine::with_client(
        fixture.client().await,
        &fixture.config(),
        Some(Arc::new(FailingLlmClient::default())),
    )
    .await
    .unwrap();

    let answer = engine.ask("active companies").await.unwrap();
    let rules_only = fixture.engine().await.ask("active companies").await.unwrap();

    assert_eq!(answer.query, rules_only.query);
    assert_eq!(answer.result.rows, rules_only.result.rows);
}

#[tokio::test]
async fn test_model_write_is_rejected_not_retried() {
    let fixture = seed().await;
    let client = MockLlmClient::new().with_response("remove", "DELETE FROM companies");
    let engine = Engine::with_client(
        fixture.client().await,
        &fixture.config(),
        Some(Arc::new(client)),
    )
    .await
    .unwrap();

    let err = engine.ask("remove all companies").await.unwrap_err();
    assert!(matches!(err, AskError::Query { .. }));
    assert_eq!(err.sql(), Some("DELETE FROM companies"));

    let text = ResultPresenter::render_error(&err, Channel::Text).to_string();
    assert!(text.ends_with("SQL: DELETE FROM companies"));

    engine.close().await;
    assert_eq!(fixture.count_rows().await, TOTAL_COMPANIES);
}

#[tokio::test]
async fn test_model_bad_column_surfaces_query_text() {
    let fixture = seed().await;
    let bad = "SELECT emal FROM companies LIMIT 10";
    let client = MockLlmClient::new().with_response("numbers", format!("```sql\n{}\n```", bad));
    let engine = Engine::with_client(
        fixture.client().await,
        &fixture.config(),
        Some(Arc::new(client)),
    )
    .await
    .unwrap();

    let err = engine.ask("company numbers").await.unwrap_err();
    assert!(matches!(err, AskError::Query { .. }));
    assert_eq!(err.sql(), Some(bad));
    assert!(err.message().contains("emal"));
}

#[tokio::test]
async fn test_model_answer_without_limit_is_capped() {
    let fixture = seed().await;
    let client = MockLlmClient::new().with_response("everything", "SELECT * FROM companies");
    let engine = Engine::with_client(
        fixture.client().await,
        &fixture.config(),
        Some(Arc::new(client)),
    )
    .await
    .unwrap();

    let answer = engine.ask("show me everything").await.unwrap();
    assert_eq!(answer.query.provenance, Provenance::Model);
    assert_eq!(answer.query.params, vec![Value::Int(10)]);
    assert_eq!(answer.result.row_count, 10);
    assert!(!answer.result.was_truncated);
    assert_eq!(answer.result.columns.len(), 7);
}

#[tokio::test]
async fn test_duplicate_column_names_keep_every_value() {
    let fixture = seed().await;
    let client = MockLlmClient::new().with_response(
        "status",
        "SELECT \"CompanyName\", \"CompanyStatus\" AS \"CompanyName\" FROM companies \
         WHERE \"CompanyName\" = 'TESCO PLC' LIMIT 1",
    );
    let engine = Engine::with_client(
        fixture.client().await,
        &fixture.config(),
        Some(Arc::new(client)),
    )
    .await
    .unwrap();

    let answer = engine.ask("tesco status").await.unwrap();
    let payload = ResultPresenter::render(&answer, Channel::Json);
    let Payload::Json(body) = payload else {
        panic!("expected a JSON payload");
    };
    assert_eq!(
        body["results"],
        json!([{"CompanyName": "TESCO PLC", "CompanyName:1": "Active"}])
    );
}

#[tokio::test]
async fn test_rendered_channels() {
    let fixture = seed().await;
    let engine = fixture.engine().await;
    let answer = engine.ask("company named Tesco").await.unwrap();

    let text = ResultPresenter::render(&answer, Channel::Text).to_string();
    assert!(text.starts_with("SQL Query: SELECT * FROM \"companies\""));
    assert!(text.contains("Found 1 results:"));
    assert!(text.contains("\" CompanyNumber\": \"00445790\""));

    let Payload::Json(envelope) = ResultPresenter::render(&answer, Channel::Json) else {
        panic!("expected JSON payload");
    };
    assert_eq!(envelope["count"], json!(1));
    assert_eq!(envelope["results"][0]["CompanyName"], json!("TESCO PLC"));

    let page = ResultPresenter::render_page(&answer.question, Some(&Ok(answer.clone())));
    assert!(page.contains("<td>TESCO PLC</td>"));
}

#[tokio::test]
async fn test_missing_database_is_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = askdb::config::Config::default();
    config.database.path = dir.path().join("absent.db");

    let err = Engine::from_config(&config).await.unwrap_err();
    assert!(matches!(err, AskError::DataUnavailable(_)));
}

#[tokio::test]
async fn test_missing_table_is_data_unavailable() {
    let fixture = seed().await;
    let mut config = fixture.config();
    config.database.table = "people".to_string();

    let err = Engine::from_config(&config).await.unwrap_err();
    assert!(matches!(err, AskError::DataUnavailable(_)));
}
