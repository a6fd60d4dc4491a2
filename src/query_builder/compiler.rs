//! SQL generation from a [`QueryState`]
//!
//! The compiler walks the state once and produces SQL text plus the ordered
//! bind parameters. Every caller-supplied value passes through
//! `bind_value`, which only ever emits placeholders; raw fragments are the
//! one exception and are copied verbatim.

use super::condition::{ConditionNode, Operator, Predicate};
use super::platforms::{Aggregate, Feature, Platform};
use super::state::{Column, QueryState, RowValues, Statement};
use crate::database::types::{SqlValue, ValueKind};
use crate::error::{Error, Result};
use std::fmt;

/// Column alias used for aggregate results
pub const AGGREGATE_ALIAS: &str = "aggregate";

/// SQL text plus its bind parameters, in placeholder order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Parameters rendered for logging
    pub fn param_strings(&self) -> Vec<String> {
        self.params.iter().map(|p| p.to_string()).collect()
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.params.is_empty() {
            write!(f, " [params: {}]", self.param_strings().join(", "))?;
        }
        Ok(())
    }
}

/// Compile a query state for a platform
pub fn compile(state: &QueryState, platform: &dyn Platform) -> Result<CompiledQuery> {
    state.conditions.check()?;

    if let Some(raw) = &state.raw {
        return Ok(CompiledQuery::new(raw.clone(), Vec::new()));
    }

    let mut compiler = Compiler::new(platform);
    let sql = match &state.statement {
        Statement::Select => compiler.select(state)?,
        Statement::Insert(row) => compiler.insert("INSERT", state, row)?,
        Statement::Replace(row) => {
            if !platform.supports(Feature::Replace) {
                return Err(Error::invalid_argument(format!(
                    "REPLACE is not supported on {}",
                    platform.kind()
                )));
            }
            compiler.insert("REPLACE", state, row)?
        }
        Statement::Update(row) => compiler.update(state, row)?,
        Statement::Delete => compiler.delete(state)?,
    };

    Ok(compiler.finish(sql))
}

/// Compile `SELECT <FN>(column) AS aggregate` over the state's filtered rows
pub fn compile_aggregate(
    state: &QueryState,
    platform: &dyn Platform,
    aggregate: Aggregate,
    column: &str,
) -> Result<CompiledQuery> {
    state.conditions.check()?;

    if state.is_raw() {
        return Err(Error::invalid_argument(
            "Aggregates cannot be applied to a raw query",
        ));
    }
    if state.statement != Statement::Select {
        return Err(Error::invalid_argument(
            "Aggregates can only be computed on SELECT queries",
        ));
    }

    let function = platform.aggregate_function(aggregate).ok_or_else(|| {
        Error::invalid_argument(format!(
            "Aggregate {:?} is not available on {}",
            aggregate,
            platform.kind()
        ))
    })?;

    let mut compiler = Compiler::new(platform);
    let alias = platform.quote_identifier(AGGREGATE_ALIAS);

    // Grouped or DISTINCT rows are counted through a derived table
    let grouped = !state.group_by.is_empty();
    let distinct_rows =
        state.distinct && (aggregate == Aggregate::Count || !state.columns.is_empty());
    if grouped || distinct_rows {
        if aggregate != Aggregate::Count {
            return Err(Error::invalid_argument(format!(
                "{:?} cannot be combined with {}",
                aggregate,
                if grouped { "GROUP BY" } else { "a DISTINCT projection" }
            )));
        }
        let mut inner = state.without_window();
        if inner.columns.is_empty() && !inner.group_by.is_empty() {
            inner.columns = inner.group_by.iter().cloned().map(Column::Name).collect();
        }
        let inner_sql = compiler.select(&inner)?;
        let sql = format!(
            "SELECT {}(*) AS {} FROM ({}) AS {}",
            function,
            alias,
            inner_sql,
            platform.quote_identifier("grouped")
        );
        return Ok(compiler.finish(sql));
    }

    let expression = match aggregate {
        Aggregate::CountDistinct => {
            if !platform.supports(Feature::CountDistinct) {
                return Err(Error::invalid_argument(format!(
                    "COUNT(DISTINCT) is not supported on {}",
                    platform.kind()
                )));
            }
            format!("{}(DISTINCT {})", function, compiler.quote_column(column))
        }
        _ => format!("{}({})", function, compiler.quote_column(column)),
    };

    let mut sql = format!("SELECT {} AS {}", expression, alias);
    sql.push_str(&compiler.from_clause(state)?);
    sql.push_str(&compiler.where_clause(state));

    Ok(compiler.finish(sql))
}

struct Compiler<'a> {
    platform: &'a dyn Platform,
    params: Vec<SqlValue>,
}

impl<'a> Compiler<'a> {
    fn new(platform: &'a dyn Platform) -> Self {
        Self {
            platform,
            params: Vec::new(),
        }
    }

    fn finish(self, sql: String) -> CompiledQuery {
        CompiledQuery::new(sql, self.params)
    }

    /// Bind a caller value and return the SQL standing in for it
    fn bind_value(&mut self, value: &SqlValue) -> String {
        match value.kind() {
            ValueKind::Null => "NULL".to_string(),
            ValueKind::List => {
                let items = match value {
                    SqlValue::List(items) => items.as_slice(),
                    _ => &[],
                };
                let placeholders: Vec<String> =
                    items.iter().map(|item| self.bind_value(item)).collect();
                format!("({})", placeholders.join(", "))
            }
            _ => {
                self.params.push(value.clone());
                self.platform.placeholder(self.params.len())
            }
        }
    }

    /// Quote a column reference, leaving expressions untouched
    fn quote_column(&self, column: &str) -> String {
        let column = column.trim();
        if column == "*" {
            return column.to_string();
        }

        if let Some((expr, alias)) = split_alias(column) {
            return format!(
                "{} AS {}",
                self.quote_column(expr),
                self.platform.quote_identifier(alias)
            );
        }

        if column.contains('(') || column.contains(char::is_whitespace) {
            return column.to_string();
        }

        column
            .split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    self.platform.quote_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a table reference, accepting `table alias` and `table AS alias`
    fn quote_table(&self, table: &str) -> String {
        let parts: Vec<&str> = table.split_whitespace().collect();
        match parts.as_slice() {
            [name, alias] => format!(
                "{} {}",
                self.quote_column(name),
                self.platform.quote_identifier(alias)
            ),
            _ => self.quote_column(table),
        }
    }

    fn table<'s>(&self, state: &'s QueryState) -> Result<&'s str> {
        state
            .table
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::invalid_argument("No table selected; call from() first"))
    }

    fn from_clause(&mut self, state: &QueryState) -> Result<String> {
        let mut sql = format!(" FROM {}", self.quote_table(self.table(state)?));
        if let Some(alias) = &state.alias {
            sql.push_str(" AS ");
            sql.push_str(&self.platform.quote_identifier(alias));
        }

        for join in &state.joins {
            sql.push(' ');
            sql.push_str(join.join_type.as_sql());
            sql.push(' ');
            sql.push_str(&self.quote_table(&join.table));
            sql.push_str(" ON ");
            sql.push_str(&join.on_condition);
        }

        Ok(sql)
    }

    fn where_clause(&mut self, state: &QueryState) -> String {
        if state.conditions.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", self.render_nodes(state.conditions.nodes()))
    }

    fn render_nodes(&mut self, nodes: &[ConditionNode]) -> String {
        let mut sql = String::new();
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(node.combinator().as_sql());
                sql.push(' ');
            }
            match node {
                ConditionNode::Leaf(predicate) => {
                    let rendered = self.render_predicate(predicate);
                    sql.push_str(&rendered);
                }
                ConditionNode::Group { children, .. } => {
                    let inner = self.render_nodes(children);
                    sql.push('(');
                    sql.push_str(&inner);
                    sql.push(')');
                }
            }
        }
        sql
    }

    fn render_predicate(&mut self, predicate: &Predicate) -> String {
        if predicate.operator == Operator::Raw {
            return predicate.column.clone();
        }

        let column = self.quote_column(&predicate.column);
        match (&predicate.operator, &predicate.value) {
            (Operator::IsNull | Operator::IsNotNull, _) => {
                format!("{} {}", column, predicate.operator.as_sql())
            }
            (Operator::Between, SqlValue::List(bounds)) if bounds.len() == 2 => {
                let low = self.bind_value(&bounds[0]);
                let high = self.bind_value(&bounds[1]);
                format!("{} BETWEEN {} AND {}", column, low, high)
            }
            (operator, value) => {
                let bound = self.bind_value(value);
                format!("{} {} {}", column, operator.as_sql(), bound)
            }
        }
    }

    fn order_clause(&self, state: &QueryState) -> String {
        if state.order_by.is_empty() {
            return String::new();
        }
        let clauses: Vec<String> = state
            .order_by
            .iter()
            .map(|clause| {
                format!(
                    "{} {}",
                    self.quote_column(&clause.column),
                    clause.direction.as_sql()
                )
            })
            .collect();
        format!(" ORDER BY {}", clauses.join(", "))
    }

    fn select(&mut self, state: &QueryState) -> Result<String> {
        let mut sql = String::from("SELECT ");
        if state.distinct {
            sql.push_str("DISTINCT ");
        }

        if state.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = state
                .columns
                .iter()
                .map(|c| match c {
                    Column::Name(name) => self.quote_column(name),
                    Column::Raw(expr) => expr.clone(),
                })
                .collect();
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(&self.from_clause(state)?);
        sql.push_str(&self.where_clause(state));

        if !state.group_by.is_empty() {
            let groups: Vec<String> = state
                .group_by
                .iter()
                .map(|c| self.quote_column(c))
                .collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups.join(", "));
        }

        sql.push_str(&self.order_clause(state));
        sql.push_str(&self.platform.limit_offset(state.limit, state.offset));

        Ok(sql)
    }

    fn check_row(verb: &str, row: &RowValues) -> Result<()> {
        if row.is_empty() {
            return Err(Error::invalid_argument(format!(
                "No data provided for {}",
                verb
            )));
        }
        if let Some((column, _)) = row.iter().find(|(_, v)| v.kind() == ValueKind::List) {
            return Err(Error::invalid_argument(format!(
                "Column '{}' cannot take a value list",
                column
            )));
        }
        Ok(())
    }

    fn insert(&mut self, verb: &str, state: &QueryState, row: &RowValues) -> Result<String> {
        Self::check_row(verb, row)?;
        let table = self.quote_table(self.table(state)?);

        let columns: Vec<String> = row
            .keys()
            .map(|k| self.platform.quote_identifier(k))
            .collect();
        let values: Vec<String> = row.values().map(|v| self.bind_value(v)).collect();

        Ok(format!(
            "{} INTO {} ({}) VALUES ({})",
            verb,
            table,
            columns.join(", "),
            values.join(", ")
        ))
    }

    fn update(&mut self, state: &QueryState, row: &RowValues) -> Result<String> {
        Self::check_row("UPDATE", row)?;
        let table = self.quote_table(self.table(state)?);

        let mut assignments = Vec::with_capacity(row.len());
        for (column, value) in row {
            let bound = self.bind_value(value);
            assignments.push(format!("{} = {}", self.quote_column(column), bound));
        }

        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        sql.push_str(&self.where_clause(state));
        sql.push_str(&self.order_clause(state));
        sql.push_str(&self.platform.limit_offset(state.limit, None));
        Ok(sql)
    }

    fn delete(&mut self, state: &QueryState) -> Result<String> {
        let table = self.quote_table(self.table(state)?);

        let mut sql = format!("DELETE FROM {}", table);
        sql.push_str(&self.where_clause(state));
        sql.push_str(&self.order_clause(state));
        sql.push_str(&self.platform.limit_offset(state.limit, None));
        Ok(sql)
    }
}

/// Split `expr AS alias` on the last case-insensitive ` AS `
fn split_alias(column: &str) -> Option<(&str, &str)> {
    let lower = column.to_ascii_lowercase();
    let pos = lower.rfind(" as ")?;
    let expr = column[..pos].trim();
    let alias = column[pos + 4..].trim();
    if expr.is_empty() || alias.is_empty() || alias.contains(char::is_whitespace) {
        return None;
    }
    Some((expr, alias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::condition::{ConditionScope, Conditions};
    use crate::query_builder::platforms::MySqlPlatform;

    fn state_for(table: &str) -> QueryState {
        QueryState {
            table: Some(table.to_string()),
            ..QueryState::default()
        }
    }

    #[test]
    fn test_quote_column_forms() {
        let platform = MySqlPlatform::new();
        let compiler = Compiler::new(&platform);
        assert_eq!(compiler.quote_column("*"), "*");
        assert_eq!(compiler.quote_column("name"), "`name`");
        assert_eq!(compiler.quote_column("u.name"), "`u`.`name`");
        assert_eq!(compiler.quote_column("u.*"), "`u`.*");
        assert_eq!(compiler.quote_column("name AS n"), "`name` AS `n`");
        assert_eq!(compiler.quote_column("COUNT(id) as total"), "COUNT(id) AS `total`");
        assert_eq!(compiler.quote_column("price * qty"), "price * qty");
    }

    #[test]
    fn test_null_binds_as_literal() {
        let platform = MySqlPlatform::new();
        let mut compiler = Compiler::new(&platform);
        assert_eq!(compiler.bind_value(&SqlValue::Null), "NULL");
        assert_eq!(
            compiler.bind_value(&SqlValue::List(vec![1.into(), 2.into()])),
            "(?, ?)"
        );
        assert_eq!(compiler.params, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_missing_table() {
        let err = compile(&QueryState::default(), &MySqlPlatform::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_raw_ignores_structure() {
        let mut state = state_for("ignored");
        state.limit = Some(5);
        state.raw = Some("SELECT 1".to_string());
        let compiled = compile(&state, &MySqlPlatform::new()).unwrap();
        assert_eq!(compiled.sql, "SELECT 1");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_update_without_conditions_has_no_where() {
        let mut state = state_for("employees");
        let mut row = RowValues::new();
        row.insert("active".to_string(), SqlValue::Bool(false));
        row.insert("note".to_string(), SqlValue::Null);
        state.statement = Statement::Update(row);

        let compiled = compile(&state, &MySqlPlatform::new()).unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE `employees` SET `active` = ?, `note` = NULL"
        );
        assert_eq!(compiled.params, vec![SqlValue::Bool(false)]);
    }

    #[test]
    fn test_grouped_count_uses_derived_table() {
        let mut state = state_for("employees");
        state.group_by.push("department".to_string());
        let mut scope = ConditionScope::new();
        scope.where_gt("salary", 1000);
        state.conditions = scope.into_list();

        let compiled =
            compile_aggregate(&state, &MySqlPlatform::new(), Aggregate::Count, "*").unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT COUNT(*) AS `aggregate` FROM (SELECT `department` FROM `employees` \
             WHERE `salary` > ? GROUP BY `department`) AS `grouped`"
        );
        assert_eq!(compiled.params, vec![SqlValue::Int(1000)]);

        let err = compile_aggregate(&state, &MySqlPlatform::new(), Aggregate::Sum, "salary")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_distinct_count_without_projection_uses_derived_table() {
        let mut state = state_for("tags");
        state.distinct = true;

        let compiled =
            compile_aggregate(&state, &MySqlPlatform::new(), Aggregate::Count, "*").unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT COUNT(*) AS `aggregate` FROM (SELECT DISTINCT * FROM `tags`) AS `grouped`"
        );

        state.columns.push(Column::Name("label".to_string()));
        let err = compile_aggregate(&state, &MySqlPlatform::new(), Aggregate::Max, "label")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_split_alias() {
        assert_eq!(split_alias("a AS b"), Some(("a", "b")));
        assert_eq!(split_alias("a as  b"), Some(("a", "b")));
        assert_eq!(split_alias("alias"), None);
        assert_eq!(split_alias("basket"), None);
    }

    #[test]
    fn test_display_lists_params() {
        let compiled = CompiledQuery::new("SELECT * FROM `t` WHERE `a` = ?", vec![1.into()]);
        assert_eq!(
            compiled.to_string(),
            "SELECT * FROM `t` WHERE `a` = ? [params: 1]"
        );
    }
}
