//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the SQLite dialect to parse SQL and classify
//! statements by their safety level.

use sqlparser::ast::{
    Expr, FunctionArguments, GroupByExpr, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor, TableWithJoins, Value as SqlValue,
};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use super::{ClassificationResult, SafetyLevel, StatementType};

/// SQL classifier that parses and classifies SQL text.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: SQLiteDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    /// Creates a new SQL classifier.
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Classifies SQL text.
    ///
    /// Text that cannot be parsed, or parses to nothing, is destructive.
    pub fn classify(&self, sql: &str) -> ClassificationResult {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(e) => {
                return ClassificationResult::with_warning(
                    SafetyLevel::Destructive,
                    StatementType::Unknown,
                    format!("Could not parse SQL: {e}"),
                )
            }
        };

        if statements.is_empty() {
            let mut result = ClassificationResult::with_warning(
                SafetyLevel::Destructive,
                StatementType::Unknown,
                "Empty SQL statement",
            );
            result.statement_count = 0;
            return result;
        }

        if statements.len() == 1 {
            let (level, stmt_type) = classify_statement(&statements[0]);
            return ClassificationResult::new(level, stmt_type);
        }

        let (level, stmt_type) = statements
            .iter()
            .map(classify_statement)
            .fold((SafetyLevel::Safe, StatementType::Unknown), most_dangerous);

        let mut result =
            ClassificationResult::new(level, StatementType::Multiple(Box::new(stmt_type)));
        result.statement_count = statements.len();
        result
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> ClassificationResult {
    SqlClassifier::new().classify(sql)
}

/// What bounds the number of rows one query can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowBound {
    /// The outer query has a LIMIT; `None` when it is not a plain number.
    Limit(Option<u64>),
    /// Ungrouped aggregates only, so at most one row.
    SingleRow,
    /// Nothing bounds the result.
    Unbounded,
}

/// Works out the [`RowBound`] of `sql`.
///
/// Returns `None` unless the text parses to exactly one query.
pub fn row_bound(sql: &str) -> Option<RowBound> {
    let statements = Parser::parse_sql(&SQLiteDialect {}, sql).ok()?;
    let [Statement::Query(query)] = statements.as_slice() else {
        return None;
    };

    if let Some(limit) = &query.limit {
        return Some(RowBound::Limit(literal_count(limit)));
    }

    match query.body.as_ref() {
        SetExpr::Select(select) if is_ungrouped_aggregate(select) => Some(RowBound::SingleRow),
        _ => Some(RowBound::Unbounded),
    }
}

fn literal_count(expr: &Expr) -> Option<u64> {
    match expr {
        Expr::Value(SqlValue::Number(n, _)) => n.parse().ok(),
        _ => None,
    }
}

fn is_ungrouped_aggregate(select: &Select) -> bool {
    let grouped = match &select.group_by {
        GroupByExpr::All(_) => true,
        GroupByExpr::Expressions(exprs, _) => !exprs.is_empty(),
    };

    !grouped
        && !select.projection.is_empty()
        && select.projection.iter().all(|item| match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                is_aggregate_call(expr)
            }
            _ => false,
        })
}

/// True for a call to one of SQLite's aggregate functions.
fn is_aggregate_call(expr: &Expr) -> bool {
    let function = match expr {
        Expr::Nested(inner) => return is_aggregate_call(inner),
        Expr::Function(function) if function.over.is_none() => function,
        _ => return false,
    };

    // min/max with several arguments are scalar in SQLite
    let single_arg = matches!(&function.args, FunctionArguments::List(list) if list.args.len() == 1);
    match function.name.to_string().to_lowercase().as_str() {
        "min" | "max" => single_arg,
        "avg" | "count" | "group_concat" | "sum" | "total" => true,
        _ => false,
    }
}

/// Keeps the more dangerous of two classifications; ties keep the first.
fn most_dangerous(
    current: (SafetyLevel, StatementType),
    candidate: (SafetyLevel, StatementType),
) -> (SafetyLevel, StatementType) {
    if candidate.0 > current.0 {
        candidate
    } else {
        current
    }
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> (SafetyLevel, StatementType) {
    match statement {
        // May contain data-modifying CTEs, so recurse
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                let (inner_level, _) = classify_statement(statement);
                (inner_level, StatementType::Explain)
            } else {
                (SafetyLevel::Safe, StatementType::Explain)
            }
        }

        Statement::Insert { .. } => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),
        Statement::Merge { .. } => (SafetyLevel::Mutating, StatementType::Merge),

        Statement::Delete { .. } => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::Truncate { .. } => (SafetyLevel::Destructive, StatementType::Truncate),
        Statement::AlterTable { .. } => (SafetyLevel::Destructive, StatementType::Alter),
        Statement::CreateTable { .. } => (SafetyLevel::Destructive, StatementType::Create),
        Statement::CreateIndex { .. } => (SafetyLevel::Destructive, StatementType::Create),
        Statement::CreateView { .. } => (SafetyLevel::Destructive, StatementType::Create),
        Statement::Pragma { .. } => (SafetyLevel::Destructive, StatementType::Pragma),
        Statement::AttachDatabase { .. } => (SafetyLevel::Destructive, StatementType::Attach),

        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Query, recursing into CTEs and the body.
fn classify_query(query: &Query) -> (SafetyLevel, StatementType) {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    ctes.chain(std::iter::once(classify_set_expr(&query.body)))
        .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous)
}

/// Classifies a SetExpr, detecting mutations and recursing into nested queries.
fn classify_set_expr(set_expr: &SetExpr) -> (SafetyLevel, StatementType) {
    match set_expr {
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => classify_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            most_dangerous(classify_set_expr(left), classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::Safe, StatementType::Select),
        #[allow(unreachable_patterns)]
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Select by checking its FROM clause for subqueries.
fn classify_select(select: &Select) -> (SafetyLevel, StatementType) {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous)
}

/// Classifies a TableWithJoins, checking the main relation and all joins.
fn classify_table_with_joins(twj: &TableWithJoins) -> (SafetyLevel, StatementType) {
    std::iter::once(&twj.relation)
        .chain(twj.joins.iter().map(|join| &join.relation))
        .map(classify_table_factor)
        .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous)
}

/// Classifies a TableFactor, recursing into derived tables (subqueries).
fn classify_table_factor(factor: &TableFactor) -> (SafetyLevel, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::Safe, StatementType::Select),
    }
}
