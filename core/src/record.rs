//! The record contract: how an application type maps onto a table.
//!
//! Implement [`Record`] by hand or with `#[derive(Record)]`. The table name
//! defaults to the type name run through [`naming::to_db_name`].

use crate::eager::Nested;
use crate::error::Result;
use crate::naming;
use crate::row::RowMap;
use crate::value::Value;

pub trait Record: Default {
    /// Rust type name, e.g. `QuestionOption`.
    const TYPE_NAME: &'static str;

    /// Explicit table name, overriding the translated type name.
    const TABLE: Option<&'static str> = None;

    /// Mapped scalar columns in declaration order. Skipped and nested fields are not listed.
    const COLUMNS: &'static [&'static str];

    const PRIMARY_KEY: &'static str = "id";

    fn table_name() -> String {
        match Self::TABLE {
            Some(table) => table.to_owned(),
            None => naming::to_db_name(Self::TYPE_NAME),
        }
    }

    /// Reads a mapped column. `None` when the column is not mapped.
    fn get(&self, column: &str) -> Option<Value>;

    /// Writes a mapped column, returning `Ok(false)` when the column is not mapped.
    fn set(&mut self, column: &str, value: Value) -> Result<bool>;

    /// Nested record and collection fields in declaration order.
    fn nested(&mut self) -> Vec<&mut dyn Nested> {
        Vec::new()
    }

    /// Opt-in lifecycle hooks. Types returning `None` skip every hook.
    fn hooks(&mut self) -> Option<&mut dyn Hooks> {
        None
    }

    /// Primary key value, `None` when unset (NULL or zero).
    fn primary_key(&self) -> Option<Value> {
        self.get(Self::PRIMARY_KEY).filter(|v| !v.is_zero_key())
    }

    /// Ordered column -> value mapping of every mapped column.
    fn to_map(&self) -> RowMap {
        Self::COLUMNS
            .iter()
            .filter_map(|column| self.get(column).map(|value| (*column, value)))
            .collect()
    }
}

/// Lifecycle callbacks run around writes and after reads. Every method
/// defaults to a no-op; an error aborts the surrounding operation.
pub trait Hooks {
    fn before_create(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_create(&mut self) -> Result<()> {
        Ok(())
    }

    fn before_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn before_delete(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_delete(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_find(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Runs `hook` when the record opts into hooks.
pub(crate) fn run_hook<R: Record>(
    record: &mut R,
    hook: impl FnOnce(&mut dyn Hooks) -> Result<()>,
) -> Result<()> {
    match record.hooks() {
        Some(hooks) => hook(hooks),
        None => Ok(()),
    }
}
