//! Clone-on-write SELECT builder.
//!
//! Every configuring method takes `&self` and returns a new [`Predicate`]
//! built from a clone of the receiver, so a shared base can be branched from
//! several places (or threads) without locking and without one branch seeing
//! another's fragments.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::dialect::{is_plain_ident, quote_ident};
use crate::error::{Result, RowkitError};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    table: Option<CompactString>,
    fields: Option<Vec<String>>,
    joins: Vec<String>,
    conditions: Vec<String>,
    args: SmallVec<[Value; 4]>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a WHERE fragment with `?` placeholders bound to `args` in order.
    pub fn r#where<I, V>(&self, fragment: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut next = self.clone();
        next.conditions.push(fragment.into());
        next.args.extend(args.into_iter().map(Into::into));
        next
    }

    /// Adds a WHERE fragment without parameters.
    pub fn condition(&self, fragment: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.conditions.push(fragment.into());
        next
    }

    /// Appends a JOIN fragment, e.g. `LEFT JOIN `b` ON `b`.`a_id` = `a`.`id``.
    pub fn join(&self, fragment: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.joins.push(fragment.into());
        next
    }

    /// Replaces the selected field list. Plain names are quoted; anything else
    /// (`t.*`, expressions) is emitted as given.
    pub fn select_fields<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.fields = Some(fields.into_iter().map(Into::into).collect());
        next
    }

    pub fn for_table(&self, table: impl Into<CompactString>) -> Self {
        let mut next = self.clone();
        next.table = Some(table.into());
        next
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Renders `SELECT <fields|*> FROM <table> <joins> [WHERE ...]`.
    pub fn render(&self) -> Result<(String, Vec<Value>)> {
        let select = match self.fields.as_deref() {
            Some(fields) if !fields.is_empty() => fields
                .iter()
                .map(|f| {
                    if is_plain_ident(f) {
                        quote_ident(f)
                    } else {
                        f.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
            _ => "*".to_owned(),
        };
        self.render_with(&select)
    }

    /// Renders `SELECT COUNT(*)` over the same FROM, JOIN and WHERE clauses.
    pub fn render_count(&self) -> Result<(String, Vec<Value>)> {
        self.render_with("COUNT(*)")
    }

    fn render_with(&self, select: &str) -> Result<(String, Vec<Value>)> {
        let table = self
            .table
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RowkitError::Argument("query has no table".into()))?;

        let mut sql = format!("SELECT {select} FROM {}", quote_ident(table));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.trim());
        }
        match self.conditions.as_slice() {
            [] => {}
            [only] => {
                sql.push_str(" WHERE ");
                sql.push_str(only.trim());
            }
            conditions => {
                // Grouped so AND never binds into an OR inside a fragment.
                let grouped = conditions
                    .iter()
                    .map(|c| format!("({})", c.trim()))
                    .collect::<Vec<_>>();
                sql.push_str(" WHERE ");
                sql.push_str(&grouped.join(" AND "));
            }
        }
        Ok((sql, self.args.to_vec()))
    }
}
