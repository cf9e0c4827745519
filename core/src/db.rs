//! The `Db` handle: pool, catalog and a chained read predicate.
//!
//! `Db` is cheap to clone. The pool and catalog are shared between clones; the
//! predicate is per clone, and every chaining method (`table`, `r#where`,
//! `join`, `fields`, ...) returns a new handle layered on a copy of it.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::config::DbConfig;
use crate::connection::{Connector, ExecResult};
use crate::dialect::{is_plain_ident, qualify};
use crate::eager::Target;
use crate::error::{Result, RowkitError};
use crate::pool::Pool;
use crate::predicate::Predicate;
use crate::record::Record;
use crate::relation::{self, Link};
use crate::row::{RowMap, Rows};
use crate::schema::{SchemaCatalog, SchemaLookup, TableSchema};
use crate::value::{FromValue, Value};

struct Shared {
    pool: Pool,
    catalog: SchemaCatalog,
    config: DbConfig,
}

#[derive(Clone)]
pub struct Db {
    shared: Arc<Shared>,
    predicate: Predicate,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("pool", &self.shared.pool)
            .field("tables", &self.shared.catalog.len())
            .field("predicate", &self.predicate)
            .finish()
    }
}

impl Db {
    pub fn new(connector: impl Connector + 'static, config: DbConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                pool: Pool::new(connector, config.pool),
                catalog: SchemaCatalog::new(),
                config,
            }),
            predicate: Predicate::new(),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.shared.pool
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.shared.catalog
    }

    pub fn config(&self) -> &DbConfig {
        &self.shared.config
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Runs a row-returning statement on a freshly leased connection.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        let mut conn = self.shared.pool.acquire()?;
        crate::rowkit_trace_query!(sql, params);
        conn.query(sql, params).inspect_err(|e| {
            crate::rowkit_trace_failure!(e, sql, params);
        })
    }

    /// Runs a statement that returns no rows on a freshly leased connection.
    pub fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        let mut conn = self.shared.pool.acquire()?;
        crate::rowkit_trace_query!(sql, params);
        conn.exec(sql, params).inspect_err(|e| {
            crate::rowkit_trace_failure!(e, sql, params);
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Schema of `table`, introspected on first reference and cached after.
    pub fn columns_of(&self, table: &str) -> Arc<TableSchema> {
        self.shared.catalog.get_or_populate(table, |table| {
            let mut conn = self.shared.pool.acquire()?;
            conn.describe_table(table)
        })
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.columns_of(table).exists()
    }

    /// Schema of a table that must exist.
    pub(crate) fn existing_table(&self, table: &str) -> Result<Arc<TableSchema>> {
        let schema = self.columns_of(table);
        if schema.exists() {
            Ok(schema)
        } else {
            Err(RowkitError::Argument(format!("unknown table `{table}`")))
        }
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    /// Resolves how `target` relates to the table of `known` and binds the
    /// query to the relevant value of `known`.
    ///
    /// Returns [`RowkitError::NotFoundRelation`] when no convention matches or
    /// when `known` does not map the column the relation binds.
    pub fn resolve<R: Record>(&self, target: &str, known: &R) -> Result<Link> {
        let known_table = R::table_name();
        let not_found = || RowkitError::NotFoundRelation {
            target: target.to_owned(),
            known: known_table.clone(),
        };

        let relation = relation::resolve(target, &known_table, self).ok_or_else(not_found)?;
        let value = known.get(relation.bound_column()).ok_or_else(not_found)?;

        let mut link = relation.link(target, value);
        if self.has_column(target, "is_deleted") {
            link.predicate = link
                .predicate
                .condition(format!("{} = 0", qualify(target, "is_deleted")));
        }
        Ok(link)
    }

    // =========================================================================
    // Chained reads
    // =========================================================================

    /// The predicate accumulated by chaining.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    fn with_predicate(&self, predicate: Predicate) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            predicate,
        }
    }

    pub fn table(&self, table: &str) -> Self {
        self.with_predicate(self.predicate.for_table(table))
    }

    pub fn r#where<I, V>(&self, fragment: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_predicate(self.predicate.r#where(fragment, args))
    }

    pub fn condition(&self, fragment: impl Into<String>) -> Self {
        self.with_predicate(self.predicate.condition(fragment))
    }

    pub fn join(&self, fragment: impl Into<String>) -> Self {
        self.with_predicate(self.predicate.join(fragment))
    }

    pub fn fields<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_predicate(self.predicate.select_fields(fields))
    }

    /// Checks the chained table and plain field names against the catalog.
    fn checked(&self) -> Result<&Predicate> {
        let table = self
            .predicate
            .table()
            .ok_or_else(|| RowkitError::Argument("query has no table".into()))?;
        let schema = self.existing_table(table)?;
        if self.predicate.joins().is_empty() {
            for field in self.predicate.fields().unwrap_or_default() {
                if is_plain_ident(field) && !schema.has_column(field) {
                    return Err(RowkitError::Argument(format!(
                        "unknown column `{field}` in `{table}`"
                    )));
                }
            }
        }
        Ok(&self.predicate)
    }

    pub fn rows(&self) -> Result<Rows> {
        let (sql, args) = self.checked()?.render()?;
        self.query(&sql, &args)
    }

    pub fn maps(&self) -> Result<Vec<RowMap>> {
        self.rows().map(Rows::maps)
    }

    pub fn first_map(&self) -> Result<Option<RowMap>> {
        self.rows().map(Rows::first_map)
    }

    /// Column positions plus text cells.
    pub fn grid(&self) -> Result<(HashMap<String, usize>, Vec<Vec<String>>)> {
        self.rows().map(|rows| rows.grid())
    }

    pub fn count(&self) -> Result<u64> {
        let (sql, args) = self.checked()?.render_count()?;
        let rows = self.query(&sql, &args)?;
        match rows.get(0).and_then(|row| row.get_at(0)) {
            Some(value) => u64::from_value(value.clone()),
            None => Ok(0),
        }
    }

    /// A column of the first row (the first column when `column` is `None`) as an integer.
    /// No rows reads as 0.
    pub fn int(&self, column: Option<&str>) -> Result<i64> {
        match self.cell(column)? {
            Value::Null => Ok(0),
            value => i64::from_value(value),
        }
    }

    /// Like [`Db::int`] but as text. No rows reads as "".
    pub fn string(&self, column: Option<&str>) -> Result<String> {
        match self.cell(column)? {
            Value::Null => Ok(String::new()),
            value => String::from_value(value),
        }
    }

    fn cell(&self, column: Option<&str>) -> Result<Value> {
        let rows = self.rows()?;
        let Some(row) = rows.get(0) else {
            return Ok(Value::Null);
        };
        let value = match column {
            Some(column) => row.get(column),
            None => row.get_at(0),
        };
        Ok(value.cloned().unwrap_or_default())
    }

    /// Loads the chained query into a record target. The target's own table is
    /// used when no table was chained.
    pub fn load<T: Target>(&self, target: &mut T) -> Result<usize> {
        let db = match self.predicate.table() {
            Some(_) => self.clone(),
            None => self.table(&T::Item::table_name()),
        };
        let rows = db.rows()?;
        self.fill(target, rows)
    }
}

/// Lazily populating view: unknown tables are introspected on first use.
impl SchemaLookup for Db {
    fn has_table(&self, table: &str) -> bool {
        Db::has_table(self, table)
    }

    fn has_column(&self, table: &str, column: &str) -> bool {
        self.columns_of(table).has_column(column)
    }
}
