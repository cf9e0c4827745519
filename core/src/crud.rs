//! Record-level find and writes, map-level writes, and batches.
//!
//! Tables carrying `created_at`, `updated_at`, `is_deleted` or `deleted_at`
//! get those columns maintained automatically. Tables with `is_deleted` are
//! soft-deleted: reads skip flagged rows and deletes set the flag instead of
//! removing the row.

use crate::db::Db;
use crate::dialect::{qualify, quote_ident};
use crate::eager::Target;
use crate::error::{Result, RowkitError};
use crate::predicate::Predicate;
use crate::record::{run_hook, Record};
use crate::row::{RowMap, Rows};
use crate::schema::TableSchema;
use crate::value::Value;

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";
const IS_DELETED: &str = "is_deleted";
const DELETED_AT: &str = "deleted_at";

/// Row selection for [`Db::find`] and [`Db::load_all`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every live row
    All,
    /// The row with this primary key
    Id(Value),
    /// A WHERE fragment with `?` placeholders
    Where(String, Vec<Value>),
    /// A complete statement, run as given
    Raw(String, Vec<Value>),
    /// A prepared predicate; the record's table is used when it has none
    Query(Predicate),
}

impl Filter {
    pub fn id(id: impl Into<Value>) -> Self {
        Filter::Id(id.into())
    }

    pub fn r#where<I, V>(fragment: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::Where(fragment.into(), args.into_iter().map(Into::into).collect())
    }

    pub fn raw<I, V>(sql: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::Raw(sql.into(), args.into_iter().map(Into::into).collect())
    }
}

impl From<Predicate> for Filter {
    fn from(predicate: Predicate) -> Self {
        Filter::Query(predicate)
    }
}

/// Result of a batch write: per-element results up to the first failure.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub completed: Vec<T>,
    /// The failure that stopped the batch. Elements after it were not processed.
    pub error: Option<RowkitError>,
}

impl<T> BatchOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<T>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.completed),
        }
    }
}

impl BatchOutcome<u64> {
    /// Sum of the completed per-element counts.
    pub fn affected(&self) -> u64 {
        self.completed.iter().sum()
    }
}

/// Tolerates a caller fragment written as a continuation (`AND x = ?`).
fn strip_leading_and(fragment: &str) -> &str {
    let fragment = fragment.trim();
    if fragment.eq_ignore_ascii_case("and") {
        return "";
    }
    match fragment.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("and ") => fragment[4..].trim_start(),
        _ => fragment,
    }
}

/// Drops keys the table does not have. An empty result is an argument error.
fn known_columns(schema: &TableSchema, table: &str, mut map: RowMap) -> Result<RowMap> {
    map.retain(|column, _| schema.has_column(column));
    if map.is_empty() {
        return Err(RowkitError::Argument(format!(
            "no columns of `{table}` to write"
        )));
    }
    Ok(map)
}

/// Sets each of `stamps` whose column exists, returning what was set.
fn stamp(schema: &TableSchema, map: &mut RowMap, stamps: &[(&str, Value)]) -> RowMap {
    let mut written = RowMap::new();
    for (column, value) in stamps {
        if schema.has_column(column) {
            map.insert(*column, value.clone());
            written.insert(*column, value.clone());
        }
    }
    written
}

/// Copies written values back into a record; unmapped columns are ignored.
fn mirror<R: Record>(record: &mut R, written: RowMap) -> Result<()> {
    for (column, value) in written {
        record.set(&column, value)?;
    }
    Ok(())
}

impl Db {
    // =========================================================================
    // Find
    // =========================================================================

    /// Loads rows of the target's table into `target`, returning the number of
    /// rows read. Soft-deleted rows are skipped. A single record is left
    /// untouched when nothing matches.
    pub fn find<T: Target>(&self, target: &mut T, filter: Filter) -> Result<usize> {
        let (sql, args) = match filter {
            Filter::Raw(sql, args) => (sql, args),
            filter => self
                .select::<T::Item>(filter)?
                .render()?,
        };
        let rows = self.query(&sql, &args)?;
        self.fill(target, rows)
    }

    fn select<R: Record>(&self, filter: Filter) -> Result<Predicate> {
        let own = Predicate::new().for_table(R::table_name());
        let predicate = match filter {
            Filter::All => own,
            Filter::Id(id) => own.r#where(format!("{} = ?", quote_ident(R::PRIMARY_KEY)), [id]),
            Filter::Where(fragment, args) => {
                let fragment = strip_leading_and(&fragment);
                if fragment.is_empty() {
                    return Err(RowkitError::Argument("empty where fragment".into()));
                }
                own.r#where(fragment, args)
            }
            Filter::Query(predicate) if predicate.table().is_none() => {
                predicate.for_table(R::table_name())
            }
            Filter::Query(predicate) => predicate,
            Filter::Raw(..) => {
                return Err(RowkitError::Argument("raw statements are not predicates".into()))
            }
        };

        let table = predicate.table().unwrap_or_default().to_owned();
        let schema = self.existing_table(&table)?;
        if !schema.has_column(IS_DELETED) {
            return Ok(predicate);
        }
        let live = format!("{} = 0", qualify(&table, IS_DELETED));
        if predicate.conditions().contains(&live) {
            Ok(predicate)
        } else {
            Ok(predicate.condition(live))
        }
    }

    /// Materializes `rows`, runs `after_find` and hands the records to `target`.
    pub(crate) fn fill<T: Target>(&self, target: &mut T, rows: Rows) -> Result<usize> {
        let mut records = rows.records::<T::Item>()?;
        for record in &mut records {
            run_hook(record, |hooks| hooks.after_find())?;
        }
        let loaded = records.len();
        target.replace(records);
        Ok(loaded)
    }

    // =========================================================================
    // Record writes
    // =========================================================================

    /// Inserts `record` and returns the generated id. An unset primary key is
    /// left to the database and written back into the record.
    pub fn create<R: Record>(&self, record: &mut R) -> Result<u64> {
        run_hook(record, |hooks| hooks.before_create())?;

        let mut map = record.to_map();
        let generated = record.primary_key().is_none();
        if generated {
            map.remove(R::PRIMARY_KEY);
        }
        let (id, written) = self.insert_row(&R::table_name(), map)?;
        mirror(record, written)?;
        if generated && id != 0 {
            record.set(R::PRIMARY_KEY, Value::UInt(id))?;
        }

        run_hook(record, |hooks| hooks.after_create())?;
        Ok(id)
    }

    /// Writes every mapped column of `record` to its row.
    pub fn update<R: Record>(&self, record: &mut R) -> Result<u64> {
        run_hook(record, |hooks| hooks.before_update())?;

        let id = record
            .primary_key()
            .ok_or_else(|| RowkitError::MissingPrimaryKey(R::table_name()))?;
        let mut map = record.to_map();
        map.remove(R::PRIMARY_KEY);
        let (affected, written) = self.update_row(&R::table_name(), R::PRIMARY_KEY, id, map)?;
        mirror(record, written)?;

        run_hook(record, |hooks| hooks.after_update())?;
        Ok(affected)
    }

    /// Deletes the row of `record`, softly when the table has `is_deleted`.
    pub fn delete<R: Record>(&self, record: &mut R) -> Result<u64> {
        run_hook(record, |hooks| hooks.before_delete())?;

        let id = record
            .primary_key()
            .ok_or_else(|| RowkitError::MissingPrimaryKey(R::table_name()))?;
        let (affected, written) = self.delete_row(&R::table_name(), R::PRIMARY_KEY, id)?;
        mirror(record, written)?;

        run_hook(record, |hooks| hooks.after_delete())?;
        Ok(affected)
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Creates each record in order, returning the generated ids.
    pub fn creates<R: Record>(&self, records: &mut [R]) -> BatchOutcome<u64> {
        self.batch("create", records, Self::create)
    }

    /// Updates each record in order, returning the affected counts.
    pub fn updates<R: Record>(&self, records: &mut [R]) -> BatchOutcome<u64> {
        self.batch("update", records, Self::update)
    }

    /// Deletes each record in order, returning the affected counts.
    pub fn deletes<R: Record>(&self, records: &mut [R]) -> BatchOutcome<u64> {
        self.batch("delete", records, Self::delete)
    }

    fn batch<R: Record>(
        &self,
        operation: &'static str,
        records: &mut [R],
        apply: impl Fn(&Self, &mut R) -> Result<u64>,
    ) -> BatchOutcome<u64> {
        let mut completed = Vec::with_capacity(records.len());
        for (index, record) in records.iter_mut().enumerate() {
            match apply(self, record) {
                Ok(n) => completed.push(n),
                Err(e) => {
                    crate::rowkit_warn!(
                        operation,
                        table = %R::table_name(),
                        index,
                        error = %e,
                        "batch aborted"
                    );
                    return BatchOutcome {
                        completed,
                        error: Some(e),
                    };
                }
            }
        }
        BatchOutcome {
            completed,
            error: None,
        }
    }

    // =========================================================================
    // Map writes
    // =========================================================================

    /// Inserts a row from a column map and returns the generated id.
    pub fn insert_map(&self, table: &str, map: RowMap) -> Result<u64> {
        self.insert_row(table, map).map(|(id, _)| id)
    }

    /// Updates the row with primary key `id`, returning the affected count.
    pub fn update_map(&self, table: &str, id: impl Into<Value>, mut map: RowMap) -> Result<u64> {
        map.remove("id");
        self.update_row(table, "id", id.into(), map)
            .map(|(affected, _)| affected)
    }

    /// Deletes the row with primary key `id`, softly when the table has `is_deleted`.
    pub fn delete_by_id(&self, table: &str, id: impl Into<Value>) -> Result<u64> {
        self.delete_row(table, "id", id.into())
            .map(|(affected, _)| affected)
    }

    pub(crate) fn insert_row(&self, table: &str, map: RowMap) -> Result<(u64, RowMap)> {
        let schema = self.existing_table(table)?;
        let mut map = known_columns(&schema, table, map)?;
        let now = Value::now();
        let written = stamp(
            &schema,
            &mut map,
            &[
                (CREATED_AT, now.clone()),
                (UPDATED_AT, now),
                (IS_DELETED, Value::Int(0)),
            ],
        );

        let (columns, values): (Vec<String>, Vec<Value>) = map.into_iter().unzip();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; values.len()].join(", "),
        );
        let result = self.exec(&sql, &values)?;
        Ok((result.last_insert_id, written))
    }

    fn update_row(
        &self,
        table: &str,
        primary_key: &str,
        id: Value,
        map: RowMap,
    ) -> Result<(u64, RowMap)> {
        if id.is_zero_key() {
            return Err(RowkitError::MissingPrimaryKey(table.to_owned()));
        }
        let schema = self.existing_table(table)?;
        let mut map = known_columns(&schema, table, map)?;
        let written = stamp(&schema, &mut map, &[(UPDATED_AT, Value::now())]);

        let (columns, mut values): (Vec<String>, Vec<Value>) = map.into_iter().unzip();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_ident(table),
            columns
                .iter()
                .map(|c| format!("{} = ?", quote_ident(c)))
                .collect::<Vec<_>>()
                .join(", "),
            quote_ident(primary_key),
        );
        values.push(id);
        let result = self.exec(&sql, &values)?;
        Ok((result.rows_affected, written))
    }

    fn delete_row(&self, table: &str, primary_key: &str, id: Value) -> Result<(u64, RowMap)> {
        if id.is_zero_key() {
            return Err(RowkitError::MissingPrimaryKey(table.to_owned()));
        }
        let schema = self.existing_table(table)?;

        if schema.has_column(IS_DELETED) {
            let mut flags = RowMap::new().with(IS_DELETED, 1);
            if schema.has_column(DELETED_AT) {
                flags.insert(DELETED_AT, Value::now());
            }
            let (affected, stamped) = self.update_row(table, primary_key, id, flags.clone())?;
            flags.extend(stamped);
            return Ok((affected, flags));
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_ident(table),
            quote_ident(primary_key),
        );
        let result = self.exec(&sql, &[id])?;
        Ok((result.rows_affected, RowMap::new()))
    }
}
