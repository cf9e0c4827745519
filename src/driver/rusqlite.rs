//! Embedded SQLite driver using [`rusqlite`].
//!
//! SQLite has no `information_schema`, so table introspection goes through
//! `PRAGMA table_info`. Backtick-quoted identifiers and `?` placeholders are
//! accepted by SQLite as is.
//!
//! ```no_run
//! let db = rowkit::driver::rusqlite::open("app.db", rowkit::DbConfig::default())?;
//! let tables = db.table("sqlite_master").fields(["name"]).maps()?;
//! # let _ = tables;
//! # Ok::<(), rowkit::RowkitError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::rusqlite::types::{ToSqlOutput, ValueRef};
use ::rusqlite::{ToSql, params_from_iter};

use rowkit_core::dialect::quote_ident;
use rowkit_core::{
    Column, Connection, Db, DbConfig, ExecResult, Result, RowkitError, Rows, Value,
};

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn execution(e: ::rusqlite::Error) -> RowkitError {
    RowkitError::Execution(e.to_string())
}

/// Binds a [`Value`] as a SQLite parameter.
struct Bind<'a>(&'a Value);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> ::rusqlite::Result<ToSqlOutput<'_>> {
        use ::rusqlite::types::Value as Sqlite;

        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(Sqlite::Null),
            Value::Int(i) => ToSqlOutput::Owned(Sqlite::Integer(*i)),
            Value::UInt(u) => match i64::try_from(*u) {
                Ok(i) => ToSqlOutput::Owned(Sqlite::Integer(i)),
                Err(_) => ToSqlOutput::Owned(Sqlite::Text(u.to_string())),
            },
            Value::Float(f) => ToSqlOutput::Owned(Sqlite::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(r) => Value::Float(r),
        ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::Bytes(blob.to_vec()),
    }
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("insert"))
}

/// A single SQLite connection.
pub struct SqliteConnection {
    conn: ::rusqlite::Connection,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = ::rusqlite::Connection::open(path).map_err(execution)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(execution)?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: ::rusqlite::Connection) -> Self {
        Self { conn }
    }
}

impl Connection for SqliteConnection {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Rows> {
        let mut stmt = self.conn.prepare(sql).map_err(execution)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
        let width = columns.len();

        let mut rows = stmt
            .query(params_from_iter(params.iter().map(Bind)))
            .map_err(execution)?;
        let mut data = Vec::new();
        while let Some(row) = rows.next().map_err(execution)? {
            let values = (0..width)
                .map(|i| row.get_ref(i).map(read_value))
                .collect::<::rusqlite::Result<Vec<_>>>()
                .map_err(execution)?;
            data.push(values);
        }
        Ok(Rows::new(columns, data))
    }

    fn exec(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        let rows_affected = self
            .conn
            .execute(sql, params_from_iter(params.iter().map(Bind)))
            .map_err(execution)?;
        let last_insert_id = if is_insert(sql) {
            u64::try_from(self.conn.last_insert_rowid()).unwrap_or_default()
        } else {
            0
        };
        Ok(ExecResult {
            rows_affected: rows_affected as u64,
            last_insert_id,
        })
    }

    fn describe_table(&mut self, table: &str) -> Result<Vec<Column>> {
        let rows = self.query(&format!("PRAGMA table_info({})", quote_ident(table)), &[])?;
        rows.iter()
            .map(|row| {
                let name: String = row.get_as("name")?;
                let column_type: String = row.get_as("type")?;
                let not_null: bool = row.get_as("notnull")?;
                let column = Column::new(&name, &column_type);
                Ok(if not_null { column.not_null() } else { column })
            })
            .collect()
    }
}

/// Opens a pooled [`Db`] over the SQLite database at `path`, creating the file
/// when missing. One connection is opened up front to surface errors early.
pub fn open(path: impl Into<PathBuf>, config: DbConfig) -> Result<Db> {
    let path = path.into();
    rowkit_core::rowkit_debug!(path = %path.display(), "rowkit.open sqlite");
    let db = Db::new(
        move || -> Result<Box<dyn Connection>> { Ok(Box::new(SqliteConnection::open(&path)?)) },
        config,
    );
    drop(db.pool().acquire()?);
    Ok(db)
}
