//! Translation of merged filters into SQL `WHERE` clauses.
//!
//! # Invariants
//! - Only declared columns reach SQL text; every value is a bind parameter.
//! - Conjuncts follow filter key order, so equal filters yield equal SQL.

use super::{StoreError, StoreResult};
use crate::model::entity::{EntityDef, PRIMARY_KEY};
use crate::model::record::Filter;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WhereClause {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

/// Builds `id = ? AND <filter conjuncts>` for `def`.
pub(crate) fn build_where(def: &EntityDef, id: &str, filter: &Filter) -> StoreResult<WhereClause> {
    let mut clause = ClauseBuilder::default();
    clause.push(format!("{PRIMARY_KEY} = ?"), [SqlValue::Text(id.to_string())]);

    for (column, value) in filter {
        if !def.has_column(column) {
            return Err(StoreError::InvalidFilter(format!(
                "unknown field `{column}` on {}",
                def.entity
            )));
        }
        clause.push_value(column, value)?;
    }

    Ok(WhereClause {
        sql: clause.conditions.join(" AND "),
        binds: clause.binds,
    })
}

/// Converts one JSON scalar to a bind value.
pub(crate) fn scalar_to_sql(column: &str, value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Ok(SqlValue::Integer(integer)),
            None => number.as_f64().map(SqlValue::Real).ok_or_else(|| {
                StoreError::InvalidFilter(format!("number out of range for `{column}`"))
            }),
        },
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(StoreError::InvalidFilter(format!(
            "expected a scalar value for `{column}`"
        ))),
    }
}

#[derive(Default)]
struct ClauseBuilder {
    conditions: Vec<String>,
    binds: Vec<SqlValue>,
}

impl ClauseBuilder {
    fn push(&mut self, condition: String, binds: impl IntoIterator<Item = SqlValue>) {
        self.conditions.push(condition);
        self.binds.extend(binds);
    }

    fn push_value(&mut self, column: &str, value: &Value) -> StoreResult<()> {
        match value {
            Value::Object(operators) => {
                for (operator, operand) in operators {
                    self.push_operator(column, operator, operand)?;
                }
                Ok(())
            }
            other => self.push_operator(column, "eq", other),
        }
    }

    fn push_operator(&mut self, column: &str, operator: &str, operand: &Value) -> StoreResult<()> {
        match (operator, operand) {
            ("eq", Value::Null) => self.push(format!("{column} IS NULL"), []),
            ("ne", Value::Null) => self.push(format!("{column} IS NOT NULL"), []),
            ("eq" | "in", Value::Array(items)) => self.push_in(column, items, false)?,
            ("ne", Value::Array(items)) => self.push_in(column, items, true)?,
            ("eq", scalar) => self.push_comparison(column, "=", scalar)?,
            ("ne", scalar) => self.push_comparison(column, "<>", scalar)?,
            ("gt", scalar) => self.push_comparison(column, ">", scalar)?,
            ("gte", scalar) => self.push_comparison(column, ">=", scalar)?,
            ("lt", scalar) => self.push_comparison(column, "<", scalar)?,
            ("lte", scalar) => self.push_comparison(column, "<=", scalar)?,
            ("like", scalar) => self.push_comparison(column, "LIKE", scalar)?,
            ("in", _) => {
                return Err(StoreError::InvalidFilter(format!(
                    "operator `in` on `{column}` expects an array"
                )))
            }
            (other, _) => {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported operator `{other}` on `{column}`"
                )))
            }
        }
        Ok(())
    }

    fn push_comparison(&mut self, column: &str, symbol: &str, operand: &Value) -> StoreResult<()> {
        if operand.is_null() {
            return Err(StoreError::InvalidFilter(format!(
                "`{symbol}` on `{column}` cannot compare against null"
            )));
        }
        let bind = scalar_to_sql(column, operand)?;
        self.push(format!("{column} {symbol} ?"), [bind]);
        Ok(())
    }

    fn push_in(&mut self, column: &str, items: &[Value], negated: bool) -> StoreResult<()> {
        if items.is_empty() {
            // Nothing is a member of an empty set.
            let always = if negated { "1 = 1" } else { "0 = 1" };
            self.push(always.to_string(), []);
            return Ok(());
        }

        let binds = items
            .iter()
            .map(|item| scalar_to_sql(column, item))
            .collect::<StoreResult<Vec<_>>>()?;
        let placeholders = vec!["?"; binds.len()].join(", ");
        let keyword = if negated { "NOT IN" } else { "IN" };
        self.push(format!("{column} {keyword} ({placeholders})"), binds);
        Ok(())
    }
}
