//! Shared fixtures: a seeded `companies` database in a temp directory.

use askdb::config::{Config, DatabaseConfig};
use askdb::db::SqliteClient;
use askdb::engine::Engine;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Number of seeded companies.
pub const TOTAL_COMPANIES: i64 = 26;

/// Number of seeded companies with status `Active`.
pub const ACTIVE_COMPANIES: usize = 21;

/// A seeded database. The directory is removed on drop.
pub struct Fixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl Fixture {
    /// Config pointing at this database with the model path disabled.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.database.path = self.path.clone();
        config.llm.provider = "none".to_string();
        config
    }

    pub fn database_config(&self) -> DatabaseConfig {
        self.config().database
    }

    /// Rules-only engine over this database.
    pub async fn engine(&self) -> Engine {
        Engine::from_config(&self.config()).await.unwrap()
    }

    /// Read-only storage client over this database.
    pub async fn client(&self) -> Arc<SqliteClient> {
        Arc::new(SqliteClient::open(&self.database_config()).await.unwrap())
    }

    /// Counts rows through a separate writable connection, bypassing askdb.
    pub async fn count_rows(&self) -> i64 {
        let pool = writable_pool(&self.path).await;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM companies")
            .fetch_one(&pool)
            .await
            .unwrap();
        pool.close().await;
        count
    }
}

async fn writable_pool(path: &std::path::Path) -> sqlx::SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap()
}

/// Creates `companies` with the dataset's column spellings, including the
/// stray leading space on `" CompanyNumber"`, plus a 1200-row `big` table.
pub async fn seed() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("companies.db");
    let pool = writable_pool(&path).await;

    sqlx::query(
        r#"
        CREATE TABLE companies (
            "CompanyName" TEXT,
            " CompanyNumber" TEXT,
            "CompanyCategory" TEXT,
            "CompanyStatus" TEXT,
            "DissolutionDate" TEXT,
            "IncorporationDate" TEXT,
            "Accounts.AccountCategory" TEXT
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let categories = [
        "Private Limited Company",
        "PRI/LBG/NSC (Private, Limited by guarantee, no share capital)",
        "Community Interest Company",
    ];
    let accounts = ["MICRO ENTITY", "SMALL", "DORMANT", "TOTAL EXEMPTION FULL"];

    for i in 0..25 {
        let dissolved = i % 5 == 0;
        sqlx::query(
            r#"
            INSERT INTO companies VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(format!("COMPANY {} LTD", i))
        .bind(format!("{:08}", i))
        .bind(categories[i % categories.len()])
        .bind(if dissolved { "Dissolved" } else { "Active" })
        .bind(dissolved.then_some("01/01/2020"))
        .bind("15/03/2010")
        .bind(accounts[i % accounts.len()])
        .execute(&pool)
        .await
        .unwrap();
    }

    sqlx::query(
        r#"
        INSERT INTO companies VALUES
            ('TESCO PLC', '00445790', 'Public Limited Company', 'Active', NULL, '27/11/1947', 'GROUP')
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE big AS
        WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 1200)
        SELECT i FROM n
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    pool.close().await;
    Fixture { _dir: dir, path }
}
