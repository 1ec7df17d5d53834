//! Deterministic rule-based resolution.
//!
//! An ordered table of `(predicate, template)` rules is matched against the
//! lower-cased question; the first match wins and the last rule always
//! matches. User-derived values are bound as parameters, never spliced into
//! the statement text.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::{Provenance, ResolvedQuery, Resolver};
use crate::db::{quote_ident, SchemaInfo, Value};
use crate::error::Result;

/// Rows returned by a non-aggregate rule unless the question asks otherwise.
pub const DEFAULT_ROW_CAP: u32 = 10;

/// Upper bound for an explicitly requested limit.
pub const MAX_REQUESTED_ROWS: u32 = 1000;

const NAME: &str = "CompanyName";
const NUMBER: &str = "CompanyNumber";
const STATUS: &str = "CompanyStatus";
const DISSOLVED_ON: &str = "DissolutionDate";
const ACCOUNT_CATEGORY: &str = "Accounts.AccountCategory";
const COMPANY_CATEGORY: &str = "CompanyCategory";

const LISTING: &[&str] = &[NAME, NUMBER, STATUS];
const DISSOLVED: &[&str] = &[NAME, NUMBER, STATUS, DISSOLVED_ON];
const ACCOUNTS: &[&str] = &[NAME, NUMBER, ACCOUNT_CATEGORY];
const CATEGORIES: &[&str] = &[NAME, NUMBER, COMPANY_CATEGORY];
const BOTH_CATEGORIES: &[&str] = &[NAME, NUMBER, COMPANY_CATEGORY, ACCOUNT_CATEGORY];

/// Lower-cased question with a word index.
struct Question {
    lower: String,
    words: Vec<String>,
}

impl Question {
    fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self { lower, words }
    }

    fn has(&self, phrase: &str) -> bool {
        self.lower.contains(phrase)
    }

    fn word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    fn about_companies(&self) -> bool {
        self.word("companies") || self.word("company")
    }
}

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Equals,
    Like,
}

impl Comparison {
    fn operator(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Like => "LIKE",
        }
    }
}

enum Template {
    /// Plain capped projection.
    Project(&'static [&'static str]),
    /// Single-row count.
    Count,
    /// Projection filtered on one column against a fixed value.
    Filter {
        columns: &'static [&'static str],
        column: &'static str,
        comparison: Comparison,
        value: &'static str,
    },
    /// Rows where any of the candidate columns is non-null.
    AnyNotNull {
        columns: &'static [&'static str],
        candidates: &'static [&'static str],
    },
    /// Substring match on the company name.
    NameSearch,
}

struct Rule {
    name: &'static str,
    matches: fn(&Question) -> bool,
    template: Template,
}

static RULES: &[Rule] = &[
    Rule {
        name: "listing",
        matches: |q| (q.word("list") || q.word("all")) && q.word("companies"),
        template: Template::Project(LISTING),
    },
    Rule {
        name: "count",
        matches: |q| {
            (q.word("count") || q.has("how many") || q.has("number of")) && q.about_companies()
        },
        template: Template::Count,
    },
    Rule {
        name: "status_active",
        matches: |q| q.word("active") && q.about_companies(),
        template: Template::Filter {
            columns: LISTING,
            column: STATUS,
            comparison: Comparison::Equals,
            value: "Active",
        },
    },
    Rule {
        name: "status_dissolved",
        matches: |q| q.word("dissolved") && q.about_companies(),
        template: Template::Filter {
            columns: DISSOLVED,
            column: STATUS,
            comparison: Comparison::Equals,
            value: "Dissolved",
        },
    },
    Rule {
        name: "accounts_none_filed",
        matches: |q| q.has("no accounts"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Equals,
            value: "NO ACCOUNTS FILED",
        },
    },
    Rule {
        name: "accounts_micro",
        matches: |q| q.word("micro"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Equals,
            value: "MICRO ENTITY",
        },
    },
    Rule {
        name: "accounts_small",
        matches: |q| q.word("small"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Equals,
            value: "SMALL",
        },
    },
    Rule {
        name: "accounts_medium",
        matches: |q| q.word("medium"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Equals,
            value: "MEDIUM",
        },
    },
    Rule {
        name: "accounts_large",
        matches: |q| q.word("large"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Equals,
            value: "LARGE",
        },
    },
    Rule {
        name: "accounts_dormant",
        matches: |q| q.word("dormant"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Equals,
            value: "DORMANT",
        },
    },
    Rule {
        name: "accounts_exemption",
        matches: |q| q.has("exemption"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Like,
            value: "%EXEMPTION%",
        },
    },
    Rule {
        name: "accounts_unaudited",
        matches: |q| q.word("unaudited"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Like,
            value: "%UNAUDITED%",
        },
    },
    Rule {
        name: "accounts_full",
        matches: |q| q.has("full accounts"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Equals,
            value: "FULL",
        },
    },
    Rule {
        name: "accounts_group",
        matches: |q| q.word("group"),
        template: Template::Filter {
            columns: ACCOUNTS,
            column: ACCOUNT_CATEGORY,
            comparison: Comparison::Equals,
            value: "GROUP",
        },
    },
    Rule {
        name: "category_private_limited",
        matches: |q| q.has("private limited"),
        template: Template::Filter {
            columns: CATEGORIES,
            column: COMPANY_CATEGORY,
            comparison: Comparison::Like,
            value: "%Private Limited Company%",
        },
    },
    Rule {
        name: "category_charitable",
        matches: |q| q.word("charitable"),
        template: Template::Filter {
            columns: CATEGORIES,
            column: COMPANY_CATEGORY,
            comparison: Comparison::Like,
            value: "%Charitable%",
        },
    },
    Rule {
        name: "category_community_interest",
        matches: |q| q.has("community interest"),
        template: Template::Filter {
            columns: CATEGORIES,
            column: COMPANY_CATEGORY,
            comparison: Comparison::Like,
            value: "%Community Interest%",
        },
    },
    Rule {
        name: "category_limited_partnership",
        matches: |q| q.has("limited partnership"),
        template: Template::Filter {
            columns: CATEGORIES,
            column: COMPANY_CATEGORY,
            comparison: Comparison::Like,
            value: "%Limited Partnership%",
        },
    },
    Rule {
        name: "category_overseas",
        matches: |q| q.word("overseas"),
        template: Template::Filter {
            columns: CATEGORIES,
            column: COMPANY_CATEGORY,
            comparison: Comparison::Like,
            value: "%Overseas%",
        },
    },
    Rule {
        name: "category_any",
        matches: |q| {
            q.has("category") || q.has("categories") || q.word("type") || q.word("types")
        },
        template: Template::AnyNotNull {
            columns: BOTH_CATEGORIES,
            candidates: &[COMPANY_CATEGORY, ACCOUNT_CATEGORY],
        },
    },
    Rule {
        name: "name_search",
        matches: |q| q.word("company") && (q.has("name") || q.word("called")),
        template: Template::NameSearch,
    },
    Rule {
        name: "default",
        matches: |_| true,
        template: Template::Project(LISTING),
    },
];

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bcompany\s+(?:named|called|name)\s+([A-Za-z0-9]+)")
            .expect("name pattern is valid")
    })
}

fn limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:top|first|limit|show)\s+(\d{1,9})\b")
            .expect("limit pattern is valid")
    })
}

/// Words that never make a useful name filter on their own.
const NAME_STOP_WORDS: &[&str] = &["company", "name", "named", "called", "the", "is", "with"];

/// Extracts the name fragment to search for.
///
/// Prefers the token right after "company named|called|name"; otherwise the
/// last alphanumeric token that is not a stop word.
fn extract_name_token(question: &str) -> Option<String> {
    if let Some(captures) = name_pattern().captures(question) {
        let token = &captures[1];
        if !NAME_STOP_WORDS.contains(&token.to_lowercase().as_str()) {
            return Some(token.to_string());
        }
    }

    question
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .rev()
        .find(|w| !NAME_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .map(str::to_string)
}

/// Reads an explicit row count like "top 25" or "limit 50", clamped to
/// `1..=MAX_REQUESTED_ROWS`.
fn requested_limit(question: &str) -> Option<u32> {
    let captures = limit_pattern().captures(question)?;
    let n: u64 = captures[1].parse().ok()?;
    Some(n.clamp(1, u64::from(MAX_REQUESTED_ROWS)) as u32)
}

/// Deterministic resolver. Never fails.
#[derive(Debug, Clone)]
pub struct RuleBasedResolver {
    row_cap: u32,
}

impl Default for RuleBasedResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_CAP)
    }
}

impl RuleBasedResolver {
    pub fn new(row_cap: u32) -> Self {
        Self {
            row_cap: row_cap.clamp(1, MAX_REQUESTED_ROWS),
        }
    }

    pub fn row_cap(&self) -> u32 {
        self.row_cap
    }

    /// Maps a question to a query. Total over all inputs.
    pub fn resolve_question(&self, question: &str, schema: &SchemaInfo) -> ResolvedQuery {
        let parsed = Question::new(question);
        let limit = requested_limit(question).unwrap_or(self.row_cap);

        RULES
            .iter()
            .filter(|rule| (rule.matches)(&parsed))
            .find_map(|rule| {
                let query = build(&rule.template, question, schema, limit)?;
                debug!(rule = rule.name, sql = %query.sql, "Matched resolution rule");
                Some(query)
            })
            .unwrap_or_else(|| listing(LISTING, schema, limit))
    }
}

#[async_trait]
impl Resolver for RuleBasedResolver {
    async fn resolve(&self, question: &str, schema: &SchemaInfo) -> Result<ResolvedQuery> {
        Ok(self.resolve_question(question, schema))
    }

    fn provenance(&self) -> Provenance {
        Provenance::Rule
    }
}

/// Instantiates a template. `None` when the snapshot lacks a column the
/// template filters on, so matching moves on to the next rule.
fn build(
    template: &Template,
    question: &str,
    schema: &SchemaInfo,
    limit: u32,
) -> Option<ResolvedQuery> {
    let table = quote_ident(&schema.table_name);
    let limit_param = Value::from(limit);

    let query = match template {
        Template::Project(columns) => listing(columns, schema, limit),
        Template::Count => ResolvedQuery::from_rule(
            format!("SELECT COUNT(*) AS total_companies FROM {}", table),
            Vec::new(),
            true,
        ),
        Template::Filter {
            columns,
            column,
            comparison,
            value,
        } => {
            let column = quote_ident(schema.resolve_column(column)?);
            ResolvedQuery::from_rule(
                format!(
                    "SELECT {} FROM {} WHERE {} {} ? LIMIT ?",
                    projection(columns, schema),
                    table,
                    column,
                    comparison.operator()
                ),
                vec![Value::from(*value), limit_param],
                false,
            )
        }
        Template::AnyNotNull {
            columns,
            candidates,
        } => {
            let conditions = candidates
                .iter()
                .filter_map(|c| schema.resolve_column(c))
                .map(|c| format!("{} IS NOT NULL", quote_ident(c)))
                .collect::<Vec<_>>();
            if conditions.is_empty() {
                return None;
            }
            ResolvedQuery::from_rule(
                format!(
                    "SELECT {} FROM {} WHERE {} LIMIT ?",
                    projection(columns, schema),
                    table,
                    conditions.join(" OR ")
                ),
                vec![limit_param],
                false,
            )
        }
        Template::NameSearch => {
            let column = quote_ident(schema.resolve_column(NAME)?);
            match extract_name_token(question) {
                Some(token) => ResolvedQuery::from_rule(
                    format!("SELECT * FROM {} WHERE {} LIKE ? LIMIT ?", table, column),
                    vec![Value::from(format!("%{}%", token)), limit_param],
                    false,
                ),
                None => listing(&[NAME, NUMBER], schema, limit),
            }
        }
    };

    Some(query)
}

fn listing(columns: &[&str], schema: &SchemaInfo, limit: u32) -> ResolvedQuery {
    ResolvedQuery::from_rule(
        format!(
            "SELECT {} FROM {} LIMIT ?",
            projection(columns, schema),
            quote_ident(&schema.table_name)
        ),
        vec![Value::from(limit)],
        false,
    )
}

/// Quoted stored spellings of the columns present in the snapshot, or `*`.
fn projection(columns: &[&str], schema: &SchemaInfo) -> String {
    let resolved = columns
        .iter()
        .filter_map(|c| schema.resolve_column(c))
        .map(quote_ident)
        .collect::<Vec<_>>();

    if resolved.is_empty() {
        "*".to_string()
    } else {
        resolved.join(", ")
    }
}
