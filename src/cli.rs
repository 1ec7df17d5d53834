//! Command-line argument parsing for askdb.

use crate::config::Config;
use crate::engine::{PageRequest, DEFAULT_PAGE_SIZE};
use crate::present::Channel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ask free-text questions about a companies table.
#[derive(Parser, Debug)]
#[command(name = "askdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Table questions are answered against
    #[arg(long, global = true, value_name = "TABLE")]
    pub table: Option<String>,

    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LLM provider to use (openai, anthropic, mock, none)
    #[arg(long, global = true, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Answer with rules only, never calling a model
    #[arg(long, global = true, conflicts_with = "llm")]
    pub no_llm: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer a question
    Ask {
        /// The question, in plain English
        #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
        question: Vec<String>,

        /// Output channel: text, json, or html
        #[arg(long, value_name = "FORMAT", default_value = "text")]
        format: Channel,

        /// Render the complete HTML question page
        #[arg(long)]
        page: bool,
    },

    /// List tables
    Tables,

    /// Describe a table's columns
    Describe {
        #[arg(value_name = "TABLE")]
        table: String,
    },

    /// Read a page of rows from a table
    Read {
        #[arg(value_name = "TABLE")]
        table: String,

        /// Rows per page (1-100)
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,

        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Comma-separated column names, spelled exactly as stored
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// WHERE clause expression
        #[arg(long, value_name = "EXPR")]
        filter: Option<String>,
    },

    /// Dump the schema snapshot
    Schema,

    /// Check storage and model availability
    Health,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        config.database.apply_env_defaults();
        if let Some(path) = &self.db {
            config.database.path = path.clone();
        }
        if let Some(table) = &self.table {
            config.database.table = table.clone();
        }
        if self.no_llm {
            config.llm.provider = "none".to_string();
        } else if let Some(provider) = &self.llm {
            config.llm.provider = provider.clone();
        }
    }
}

impl Command {
    /// Joins the words of an `ask` question.
    pub fn question(&self) -> Option<String> {
        match self {
            Self::Ask { question, .. } => Some(question.join(" ")),
            _ => None,
        }
    }

    /// Builds the page request for `read`.
    pub fn page_request(&self) -> Option<PageRequest> {
        match self {
            Self::Read {
                limit,
                offset,
                columns,
                filter,
                ..
            } => Some(PageRequest {
                limit: *limit,
                offset: *offset,
                columns: columns.clone(),
                filter: filter.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_ask() {
        let cli = parse_args(&["askdb", "ask", "how", "many", "companies"]);
        assert_eq!(
            cli.command.question().as_deref(),
            Some("how many companies")
        );
        assert!(matches!(
            cli.command,
            Command::Ask {
                format: Channel::Text,
                page: false,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_ask_format() {
        let cli = parse_args(&["askdb", "ask", "--format", "json", "active companies"]);
        assert!(matches!(
            cli.command,
            Command::Ask {
                format: Channel::Json,
                ..
            }
        ));

        let cli = parse_args(&["askdb", "ask", "--page", "x"]);
        assert!(matches!(cli.command, Command::Ask { page: true, .. }));
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["askdb", "ask"]).is_err());
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(Cli::try_parse_from(["askdb", "ask", "--format", "xml", "q"]).is_err());
    }

    #[test]
    fn test_parse_read() {
        let cli = parse_args(&[
            "askdb",
            "read",
            "companies",
            "--limit",
            "5",
            "--offset",
            "10",
            "--columns",
            "CompanyName, CompanyNumber",
            "--filter",
            "\"CompanyStatus\" = 'Active'",
        ]);
        let page = cli.command.page_request().unwrap();

        assert_eq!(page.limit, 5);
        assert_eq!(page.offset, 10);
        // Names are passed through untouched, leading space included
        assert_eq!(
            page.columns,
            Some(vec!["CompanyName".to_string(), " CompanyNumber".to_string()])
        );
        assert_eq!(page.filter.as_deref(), Some("\"CompanyStatus\" = 'Active'"));
    }

    #[test]
    fn test_read_defaults() {
        let cli = parse_args(&["askdb", "read", "companies"]);
        assert_eq!(cli.command.page_request().unwrap(), PageRequest::default());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = parse_args(&["askdb", "health", "--db", "/tmp/c.db", "--no-llm"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/c.db")));
        assert!(cli.no_llm);
        assert_eq!(cli.command, Command::Health);
    }

    #[test]
    fn test_llm_conflicts_with_no_llm() {
        assert!(Cli::try_parse_from(["askdb", "--llm", "openai", "--no-llm", "tables"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let cli = parse_args(&[
            "askdb",
            "--db",
            "/data/uk.db",
            "--table",
            "firms",
            "--no-llm",
            "schema",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.database.path, PathBuf::from("/data/uk.db"));
        assert_eq!(config.database.table, "firms");
        assert_eq!(config.llm.provider().unwrap(), None);
    }

    #[test]
    fn test_parse_config_path() {
        let cli = parse_args(&["askdb", "--config", "/path/to/config.toml", "tables"]);
        assert_eq!(cli.config_path(), PathBuf::from("/path/to/config.toml"));
    }
}
