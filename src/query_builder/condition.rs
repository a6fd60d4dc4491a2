//! Condition tree for WHERE clauses
//!
//! Predicates are collected into a [`ConditionList`]: an ordered list of
//! leaves and parenthesised groups. Each node after the first carries the
//! combinator joining it to its predecessor.
//!
//! The [`Conditions`] trait provides the `where_*` / `or_where_*` family to
//! both the query builder and the [`ConditionScope`] handed to group
//! callbacks, so groups nest to any depth.

use crate::database::types::SqlValue;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Boolean connective between two sibling nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// Comparison operator of a leaf predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    /// Verbatim predicate fragment carried in the column slot
    Raw,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Raw => "",
        }
    }

    /// Whether the operator is followed by a bound value
    pub fn takes_value(&self) -> bool {
        !matches!(self, Operator::IsNull | Operator::IsNotNull | Operator::Raw)
    }

    fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn | Operator::Between)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "=" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Lte),
            ">=" => Ok(Operator::Gte),
            "LIKE" => Ok(Operator::Like),
            "NOT LIKE" => Ok(Operator::NotLike),
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "BETWEEN" => Ok(Operator::Between),
            _ => Err(Error::invalid_argument(format!(
                "Unsupported operator '{}'",
                s
            ))),
        }
    }
}

/// A single `column op value` test
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: SqlValue,
    pub combinator: Combinator,
}

/// One node of the condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Leaf(Predicate),
    Group {
        children: Vec<ConditionNode>,
        combinator: Combinator,
    },
}

impl ConditionNode {
    pub fn combinator(&self) -> Combinator {
        match self {
            ConditionNode::Leaf(predicate) => predicate.combinator,
            ConditionNode::Group { combinator, .. } => *combinator,
        }
    }
}

/// Ordered sibling nodes plus the builder-side bookkeeping
///
/// A rejected predicate is not added. The first rejection is kept and
/// reported by [`ConditionList::check`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionList {
    nodes: Vec<ConditionNode>,
    pending: Option<Combinator>,
    rejected: Option<String>,
}

impl ConditionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[ConditionNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Make the next `where_*` call join with OR
    pub fn set_pending(&mut self, combinator: Combinator) {
        self.pending = Some(combinator);
    }

    /// Error for the first rejected predicate, if any
    pub fn check(&self) -> Result<()> {
        match &self.rejected {
            Some(message) => Err(Error::invalid_argument(message.clone())),
            None => Ok(()),
        }
    }

    pub fn reject(&mut self, message: impl Into<String>) {
        if self.rejected.is_none() {
            self.rejected = Some(message.into());
        }
    }

    /// An `or_where_*` call also makes the following `where_*` join with OR
    fn next_combinator(&mut self, forced: Option<Combinator>) -> Combinator {
        let pending = self.pending.take();
        if forced == Some(Combinator::Or) {
            self.pending = Some(Combinator::Or);
        }
        forced.or(pending).unwrap_or(Combinator::And)
    }

    /// Validate and append a leaf predicate
    pub fn push(
        &mut self,
        column: String,
        operator: Operator,
        value: SqlValue,
        forced: Option<Combinator>,
    ) {
        let combinator = self.next_combinator(forced);

        match validate(&column, operator, value) {
            Ok(value) => self.nodes.push(ConditionNode::Leaf(Predicate {
                column,
                operator,
                value,
                combinator,
            })),
            Err(message) => self.reject(message),
        }
    }

    /// Append a group built in a nested scope. Empty groups are dropped.
    pub fn push_group(&mut self, group: ConditionList, forced: Option<Combinator>) {
        let combinator = self.next_combinator(forced);

        if let Some(message) = group.rejected {
            self.reject(message);
        }
        if group.nodes.is_empty() {
            return;
        }

        self.nodes.push(ConditionNode::Group {
            children: group.nodes,
            combinator,
        });
    }
}

/// Check a predicate and normalise its value
fn validate(
    column: &str,
    operator: Operator,
    value: SqlValue,
) -> std::result::Result<SqlValue, String> {
    if column.trim().is_empty() {
        return Err(match operator {
            Operator::Raw => "Raw predicate cannot be empty".to_string(),
            _ => "Predicate column cannot be empty".to_string(),
        });
    }

    if !operator.takes_value() {
        return Ok(SqlValue::Null);
    }

    if value.is_empty() {
        return Err(format!(
            "Empty or NULL value for '{}' {}; use where_null / where_not_null to test for NULL",
            column, operator
        ));
    }

    match (operator, value) {
        (Operator::Between, SqlValue::List(bounds)) => {
            if bounds.len() != 2 || bounds.iter().any(SqlValue::is_empty) {
                return Err(format!(
                    "BETWEEN on '{}' needs exactly two non-empty bounds",
                    column
                ));
            }
            Ok(SqlValue::List(bounds))
        }
        (Operator::Between, _) => Err(format!(
            "BETWEEN on '{}' needs exactly two non-empty bounds",
            column
        )),
        (Operator::In | Operator::NotIn, SqlValue::List(values)) => {
            if values.iter().any(|v| v.is_null() || matches!(v, SqlValue::List(_))) {
                return Err(format!("{} list for '{}' contains NULL or a nested list", operator, column));
            }
            Ok(SqlValue::List(values))
        }
        // A scalar on the right of IN is a one-element list
        (Operator::In | Operator::NotIn, scalar) => Ok(SqlValue::List(vec![scalar])),
        (op, SqlValue::List(_)) if !op.takes_list() => Err(format!(
            "Operator {} on '{}' does not accept a value list",
            op, column
        )),
        (_, value) => Ok(value),
    }
}

/// Escape LIKE wildcards and wrap the needle for a substring match
///
/// Backslash is MySQL's default LIKE escape character.
pub fn contain_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Nested builder handed to `where_group` callbacks
#[derive(Debug, Default)]
pub struct ConditionScope {
    list: ConditionList,
}

impl ConditionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_list(self) -> ConditionList {
        self.list
    }
}

impl Conditions for ConditionScope {
    fn conditions_mut(&mut self) -> &mut ConditionList {
        &mut self.list
    }
}

/// WHERE-clause construction shared by the builder and nested scopes
///
/// `where_*` joins with AND, or with OR when the call right before it was
/// an `or_where_*` or [`Conditions::or`]. `or_where_*` always joins with OR.
pub trait Conditions {
    fn conditions_mut(&mut self) -> &mut ConditionList;

    #[doc(hidden)]
    fn add_predicate(
        &mut self,
        column: String,
        operator: Operator,
        value: SqlValue,
        forced: Option<Combinator>,
    ) -> &mut Self
    where
        Self: Sized,
    {
        self.conditions_mut().push(column, operator, value, forced);
        self
    }

    #[doc(hidden)]
    fn add_parsed(
        &mut self,
        column: String,
        operator: &str,
        value: SqlValue,
        forced: Option<Combinator>,
    ) -> &mut Self
    where
        Self: Sized,
    {
        match operator.parse::<Operator>() {
            Ok(op) => self.add_predicate(column, op, value, forced),
            Err(e) => {
                let list = self.conditions_mut();
                list.next_combinator(forced);
                list.reject(e.to_string());
                self
            }
        }
    }

    /// Join the next `where_*` call with OR
    fn or(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.conditions_mut().set_pending(Combinator::Or);
        self
    }

    /// `column = value`
    fn where_eq<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Eq, value.into(), None)
    }

    /// `column <op> value`, where `op` is one of `= != <> < > <= >= LIKE NOT LIKE IN NOT IN`
    fn where_op<C: Into<String>, V: Into<SqlValue>>(
        &mut self,
        column: C,
        operator: &str,
        value: V,
    ) -> &mut Self
    where
        Self: Sized,
    {
        self.add_parsed(column.into(), operator, value.into(), None)
    }

    fn where_ne<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::NotEq, value.into(), None)
    }

    fn where_gt<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Gt, value.into(), None)
    }

    fn where_lt<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Lt, value.into(), None)
    }

    fn where_gte<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Gte, value.into(), None)
    }

    fn where_lte<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Lte, value.into(), None)
    }

    fn where_like<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, pattern: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Like, pattern.into(), None)
    }

    fn where_not_like<C: Into<String>, V: Into<SqlValue>>(
        &mut self,
        column: C,
        pattern: V,
    ) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::NotLike, pattern.into(), None)
    }

    fn where_in<C, I, V>(&mut self, column: C, values: I) -> &mut Self
    where
        Self: Sized,
        C: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let list = values.into_iter().collect::<SqlValue>();
        self.add_predicate(column.into(), Operator::In, list, None)
    }

    fn where_not_in<C, I, V>(&mut self, column: C, values: I) -> &mut Self
    where
        Self: Sized,
        C: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let list = values.into_iter().collect::<SqlValue>();
        self.add_predicate(column.into(), Operator::NotIn, list, None)
    }

    fn where_between<C: Into<String>, V: Into<SqlValue>>(
        &mut self,
        column: C,
        low: V,
        high: V,
    ) -> &mut Self
    where
        Self: Sized,
    {
        let bounds = SqlValue::List(vec![low.into(), high.into()]);
        self.add_predicate(column.into(), Operator::Between, bounds, None)
    }

    fn where_null<C: Into<String>>(&mut self, column: C) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::IsNull, SqlValue::Null, None)
    }

    fn where_not_null<C: Into<String>>(&mut self, column: C) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::IsNotNull, SqlValue::Null, None)
    }

    /// Verbatim predicate fragment. Never pass caller input here.
    fn where_raw<S: Into<String>>(&mut self, fragment: S) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(fragment.into(), Operator::Raw, SqlValue::Null, None)
    }

    /// `column LIKE %needle%` with the needle's wildcards escaped
    fn where_contain<C: Into<String>>(&mut self, column: C, needle: &str) -> &mut Self
    where
        Self: Sized,
    {
        let column = column.into();
        if needle.is_empty() {
            let list = self.conditions_mut();
            list.next_combinator(None);
            list.reject(format!("Empty search value for '{}'", column));
            return self;
        }
        self.add_predicate(column, Operator::Like, contain_pattern(needle).into(), None)
    }

    /// Parenthesised group of predicates
    fn where_group<F>(&mut self, build: F) -> &mut Self
    where
        Self: Sized,
        F: FnOnce(&mut ConditionScope),
    {
        let mut scope = ConditionScope::new();
        build(&mut scope);
        self.conditions_mut().push_group(scope.into_list(), None);
        self
    }

    fn or_where_eq<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Eq, value.into(), Some(Combinator::Or))
    }

    fn or_where_op<C: Into<String>, V: Into<SqlValue>>(
        &mut self,
        column: C,
        operator: &str,
        value: V,
    ) -> &mut Self
    where
        Self: Sized,
    {
        self.add_parsed(column.into(), operator, value.into(), Some(Combinator::Or))
    }

    fn or_where_ne<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::NotEq, value.into(), Some(Combinator::Or))
    }

    fn or_where_gt<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Gt, value.into(), Some(Combinator::Or))
    }

    fn or_where_lt<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Lt, value.into(), Some(Combinator::Or))
    }

    fn or_where_gte<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Gte, value.into(), Some(Combinator::Or))
    }

    fn or_where_lte<C: Into<String>, V: Into<SqlValue>>(&mut self, column: C, value: V) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Lte, value.into(), Some(Combinator::Or))
    }

    fn or_where_like<C: Into<String>, V: Into<SqlValue>>(
        &mut self,
        column: C,
        pattern: V,
    ) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(column.into(), Operator::Like, pattern.into(), Some(Combinator::Or))
    }

    fn or_where_not_like<C: Into<String>, V: Into<SqlValue>>(
        &mut self,
        column: C,
        pattern: V,
    ) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(
            column.into(),
            Operator::NotLike,
            pattern.into(),
            Some(Combinator::Or),
        )
    }

    fn or_where_in<C, I, V>(&mut self, column: C, values: I) -> &mut Self
    where
        Self: Sized,
        C: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let list = values.into_iter().collect::<SqlValue>();
        self.add_predicate(column.into(), Operator::In, list, Some(Combinator::Or))
    }

    fn or_where_not_in<C, I, V>(&mut self, column: C, values: I) -> &mut Self
    where
        Self: Sized,
        C: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let list = values.into_iter().collect::<SqlValue>();
        self.add_predicate(column.into(), Operator::NotIn, list, Some(Combinator::Or))
    }

    fn or_where_between<C: Into<String>, V: Into<SqlValue>>(
        &mut self,
        column: C,
        low: V,
        high: V,
    ) -> &mut Self
    where
        Self: Sized,
    {
        let bounds = SqlValue::List(vec![low.into(), high.into()]);
        self.add_predicate(column.into(), Operator::Between, bounds, Some(Combinator::Or))
    }

    fn or_where_null<C: Into<String>>(&mut self, column: C) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(
            column.into(),
            Operator::IsNull,
            SqlValue::Null,
            Some(Combinator::Or),
        )
    }

    fn or_where_not_null<C: Into<String>>(&mut self, column: C) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(
            column.into(),
            Operator::IsNotNull,
            SqlValue::Null,
            Some(Combinator::Or),
        )
    }

    fn or_where_raw<S: Into<String>>(&mut self, fragment: S) -> &mut Self
    where
        Self: Sized,
    {
        self.add_predicate(
            fragment.into(),
            Operator::Raw,
            SqlValue::Null,
            Some(Combinator::Or),
        )
    }

    fn or_where_contain<C: Into<String>>(&mut self, column: C, needle: &str) -> &mut Self
    where
        Self: Sized,
    {
        let column = column.into();
        if needle.is_empty() {
            let list = self.conditions_mut();
            list.next_combinator(Some(Combinator::Or));
            list.reject(format!("Empty search value for '{}'", column));
            return self;
        }
        self.add_predicate(
            column,
            Operator::Like,
            contain_pattern(needle).into(),
            Some(Combinator::Or),
        )
    }

    fn or_where_group<F>(&mut self, build: F) -> &mut Self
    where
        Self: Sized,
        F: FnOnce(&mut ConditionScope),
    {
        let mut scope = ConditionScope::new();
        build(&mut scope);
        self.conditions_mut()
            .push_group(scope.into_list(), Some(Combinator::Or));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combinators(list: &ConditionList) -> Vec<Combinator> {
        list.nodes().iter().map(|n| n.combinator()).collect()
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!("!=".parse::<Operator>().unwrap(), Operator::NotEq);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::NotEq);
        assert_eq!("not  like".parse::<Operator>().unwrap(), Operator::NotLike);
        assert_eq!("In".parse::<Operator>().unwrap(), Operator::In);
        assert!(matches!(
            "===".parse::<Operator>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_or_applies_to_next_call_only() {
        let mut scope = ConditionScope::new();
        scope
            .where_eq("a", 1)
            .or()
            .where_eq("b", 2)
            .where_eq("c", 3)
            .or_where_eq("d", 4)
            .where_eq("e", 5)
            .where_eq("f", 6);

        let list = scope.into_list();
        assert_eq!(
            combinators(&list),
            vec![
                Combinator::And,
                Combinator::Or,
                Combinator::And,
                Combinator::Or,
                Combinator::Or,
                Combinator::And
            ]
        );
    }

    #[test]
    fn test_where_after_or_where_joins_with_or() {
        let mut scope = ConditionScope::new();
        scope.where_eq("a", 1).or_where_eq("b", 2).where_eq("c", 3);
        assert_eq!(
            combinators(&scope.into_list()),
            vec![Combinator::And, Combinator::Or, Combinator::Or]
        );

        let mut scope = ConditionScope::new();
        scope
            .where_eq("a", 1)
            .or_where_group(|g| {
                g.where_eq("b", 2);
            })
            .where_group(|g| {
                g.where_eq("c", 3);
            });
        assert_eq!(
            combinators(&scope.into_list()),
            vec![Combinator::And, Combinator::Or, Combinator::Or]
        );
    }

    #[test]
    fn test_empty_values_are_rejected() {
        let mut scope = ConditionScope::new();
        scope.where_eq("a", SqlValue::Null);
        assert!(scope.conditions_mut().check().is_err());
        assert!(scope.conditions_mut().is_empty());

        let mut scope = ConditionScope::new();
        scope.where_eq("a", "");
        assert!(scope.conditions_mut().check().is_err());

        let mut scope = ConditionScope::new();
        scope.where_in("a", Vec::<i32>::new());
        assert!(scope.conditions_mut().check().is_err());

        let mut scope = ConditionScope::new();
        scope.where_contain("name", "");
        assert!(scope.conditions_mut().check().is_err());
    }

    #[test]
    fn test_first_rejection_is_kept() {
        let mut scope = ConditionScope::new();
        scope
            .where_op("a", "~", 1)
            .where_eq("b", "")
            .where_eq("c", 3);

        let list = scope.into_list();
        assert_eq!(list.nodes().len(), 1);
        match list.check() {
            Err(Error::InvalidArgument(message)) => assert!(message.contains("'~'")),
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_list_rejected_for_scalar_operator() {
        let mut scope = ConditionScope::new();
        scope.where_eq("a", vec![1, 2].into_iter().collect::<SqlValue>());
        assert!(scope.conditions_mut().check().is_err());
    }

    #[test]
    fn test_scalar_in_becomes_list() {
        let mut scope = ConditionScope::new();
        scope.where_op("id", "IN", 5);
        let list = scope.into_list();
        match &list.nodes()[0] {
            ConditionNode::Leaf(p) => {
                assert_eq!(p.operator, Operator::In);
                assert_eq!(p.value, SqlValue::List(vec![SqlValue::Int(5)]));
            }
            other => panic!("Expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_contain_pattern_escapes_wildcards() {
        assert_eq!(contain_pattern("Nat"), "%Nat%");
        assert_eq!(contain_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_empty_group_is_dropped() {
        let mut scope = ConditionScope::new();
        scope.where_eq("a", 1).or_where_group(|_| {}).where_eq("b", 2);

        let list = scope.into_list();
        assert_eq!(list.nodes().len(), 2);
        assert!(list
            .nodes()
            .iter()
            .all(|n| matches!(n, ConditionNode::Leaf(_))));
    }

    #[test]
    fn test_group_rejection_propagates() {
        let mut scope = ConditionScope::new();
        scope.where_eq("a", 1).where_group(|g| {
            g.where_eq("b", SqlValue::Null);
        });
        assert!(scope.into_list().check().is_err());
    }

    #[test]
    fn test_nested_groups_keep_combinators() {
        let mut scope = ConditionScope::new();
        scope.where_eq("a", 1).or_where_group(|g| {
            g.where_eq("b", 2).where_group(|inner| {
                inner.where_eq("c", 3).or_where_eq("d", 4);
            });
        });

        let list = scope.into_list();
        match &list.nodes()[1] {
            ConditionNode::Group {
                children,
                combinator,
            } => {
                assert_eq!(*combinator, Combinator::Or);
                assert_eq!(children.len(), 2);
                assert!(matches!(
                    children[1],
                    ConditionNode::Group {
                        combinator: Combinator::And,
                        ..
                    }
                ));
            }
            other => panic!("Expected group, got {:?}", other),
        }
    }
}
