//! askdb - ask free-text questions about a companies table.

use anyhow::{Context, Result};
use askdb::cli::{Cli, Command};
use askdb::config::Config;
use askdb::engine::Engine;
use askdb::logging;
use askdb::present::{Channel, ResultPresenter};
use serde::Serialize;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    match &cli.log_file {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let engine = Engine::from_config(&config)
        .await
        .with_context(|| format!("Failed to open {}", config.database.path.display()))?;

    let code = match &cli.command {
        Command::Ask { format, page, .. } => {
            let question = cli.command.question().unwrap_or_default();
            ask(&engine, &question, *format, *page).await
        }
        Command::Tables => print_json(&engine.list_tables().await?)?,
        Command::Describe { table } => print_json(&engine.describe_table(table).await?)?,
        Command::Read { table, .. } => {
            let page = cli.command.page_request().unwrap_or_default();
            print_json(&engine.read_table_data(table, &page).await?)?
        }
        Command::Schema => print_json(&engine.schema().await?)?,
        Command::Health => print_json(&engine.health().await?)?,
    };

    engine.close().await;
    Ok(code)
}

/// Answers one question, printing the rendered answer or error.
async fn ask(engine: &Engine, question: &str, channel: Channel, page: bool) -> ExitCode {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let outcome = engine.ask_cancellable(question, &cancel).await;

    if page {
        println!("{}", ResultPresenter::render_page(question, Some(&outcome)));
        return if outcome.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    match outcome {
        Ok(answer) => {
            println!("{}", ResultPresenter::render(&answer, channel));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}: {}", e.category(), e);
            println!("{}", ResultPresenter::render_error(&e, channel));
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}
