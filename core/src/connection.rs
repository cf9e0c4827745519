//! Driver boundary.
//!
//! A driver provides a [`Connector`] that opens [`Connection`]s; the pool owns
//! them and leases one per statement.

use crate::dialect;
use crate::error::Result;
use crate::row::Rows;
use crate::schema::Column;
use crate::value::Value;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Auto-increment id generated by an INSERT, 0 when none
    pub last_insert_id: u64,
}

/// One live driver connection. Statements use positional `?` placeholders.
pub trait Connection: Send {
    /// Runs a statement returning rows and buffers the whole result set.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Rows>;

    /// Runs a statement that does not return rows.
    fn exec(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult>;

    /// Column metadata of `table`, empty when the table does not exist.
    ///
    /// The default reads `information_schema.COLUMNS` of the current database.
    fn describe_table(&mut self, table: &str) -> Result<Vec<Column>> {
        let rows = self.query(dialect::COLUMNS_QUERY, &[Value::from(table)])?;
        Ok(dialect::columns_from_rows(&rows))
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Rows> {
        (**self).query(sql, params)
    }

    fn exec(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        (**self).exec(sql, params)
    }

    fn describe_table(&mut self, table: &str) -> Result<Vec<Column>> {
        (**self).describe_table(table)
    }
}

/// Opens new connections for the pool.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Connection>>;
}

impl<F> Connector for F
where
    F: Fn() -> Result<Box<dyn Connection>> + Send + Sync,
{
    fn connect(&self) -> Result<Box<dyn Connection>> {
        self()
    }
}
