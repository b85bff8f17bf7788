// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Table query description shared by every backend.
//!
//! A `Query` is a small, backend-neutral filter/order/limit description.
//! The Supabase client renders it as PostgREST query parameters; the
//! in-memory backend evaluates it directly against JSON rows.

use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;

use crate::time_utils::parse_timestamp;

/// Comparison applied to a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Filters, ordering and limit for a table read or update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns (`select=` in PostgREST).
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(column.to_string(), value.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::IsNull(column.to_string()));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), Direction::Asc));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), Direction::Desc));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as PostgREST query-string pairs.
    pub fn to_postgrest_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);

        params.push((
            "select".to_string(),
            self.columns.clone().unwrap_or_else(|| "*".to_string()),
        ));

        for filter in &self.filters {
            let (column, expr) = match filter {
                Filter::Eq(col, v) => (col, format!("eq.{}", literal(v))),
                Filter::Gte(col, v) => (col, format!("gte.{}", literal(v))),
                Filter::In(col, values) => {
                    let items: Vec<String> = values.iter().map(quoted_literal).collect();
                    (col, format!("in.({})", items.join(",")))
                }
                Filter::IsNull(col) => (col, "is.null".to_string()),
            };
            params.push((column.clone(), expr));
        }

        if let Some((column, direction)) = &self.order {
            let dir = match direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            params.push(("order".to_string(), format!("{}.{}", column, dir)));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }

    /// Whether a row satisfies every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Eq(col, v) => row
                .get(col)
                .is_some_and(|cell| compare_cell(cell, v) == Some(Ordering::Equal)),
            Filter::Gte(col, v) => row.get(col).is_some_and(|cell| {
                matches!(
                    compare_cell(cell, v),
                    Some(Ordering::Greater | Ordering::Equal)
                )
            }),
            Filter::In(col, values) => row.get(col).is_some_and(|cell| {
                values
                    .iter()
                    .any(|v| compare_cell(cell, v) == Some(Ordering::Equal))
            }),
            Filter::IsNull(col) => row.get(col).map_or(true, Value::is_null),
        })
    }

    /// Filter, sort and truncate a set of rows the way the server would.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
        let mut selected: Vec<Value> = rows
            .into_iter()
            .filter(|row| self.matches(row))
            .cloned()
            .collect();

        if let Some((column, direction)) = &self.order {
            selected.sort_by(|a, b| {
                let ord = match (a.get(column), b.get(column)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        selected
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Values inside `in.(...)` are double-quoted so commas and dots survive.
fn quoted_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        other => other.to_string(),
    }
}

/// Compare a stored cell with a filter value the way Postgres does: the
/// filter literal takes the column's type, so a timestamp compared against
/// a `date` column is cut down to its day first.
fn compare_cell(cell: &Value, filter: &Value) -> Option<Ordering> {
    if let (Value::String(c), Value::String(f)) = (cell, filter) {
        if let (Ok(day), Some(instant)) = (
            NaiveDate::parse_from_str(c, "%Y-%m-%d"),
            parse_timestamp(f),
        ) {
            return Some(day.cmp(&instant.date_naive()));
        }
    }
    compare_values(cell, filter)
}

/// Compare two JSON cells. Strings that both parse as timestamps (or dates)
/// compare chronologically; numbers compare numerically; `null` only equals
/// `null`. Incomparable pairs yield `None`.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
            _ => Some(x.cmp(y)),
        },
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.parse::<f64>().ok()?),
        (Value::String(x), Value::Number(y)) => x.parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        _ => None,
    }
}
