//! Map-based CRUD for request handlers.
//!
//! Every call reports exactly once through the injected [`Render`], either
//! with a [`Payload`] or with a [`Sentinel`] saying whether the caller's
//! arguments or the execution was at fault. The request-to-map binding and
//! the response serialization both belong to the caller.

use std::sync::Arc;

use thiserror::Error;

use crate::db::Db;
use crate::dialect::{qualify, quote_ident};
use crate::error::{Result, RowkitError};
use crate::predicate::Predicate;
use crate::record::Record;
use crate::row::RowMap;
use crate::value::Value;

/// Coarse failure class handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Sentinel {
    #[error("argument error")]
    Args,
    #[error("execution error")]
    Exec,
}

impl From<&RowkitError> for Sentinel {
    fn from(err: &RowkitError) -> Self {
        match err {
            RowkitError::Argument(_)
            | RowkitError::MissingPrimaryKey(_)
            | RowkitError::NotFoundRelation { .. } => Sentinel::Args,
            RowkitError::Execution(_) | RowkitError::Conversion(_) | RowkitError::Pool(_) => {
                Sentinel::Exec
            }
        }
    }
}

/// Successful outcome of a resource call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Payload {
    /// Update or delete succeeded
    Done,
    /// The inserted row, including its id and maintained timestamps
    Created(RowMap),
    Rows(Vec<RowMap>),
}

/// Receives the outcome of each resource call.
pub trait Render<S: ?Sized>: Send + Sync {
    fn render(&self, sink: &mut S, outcome: std::result::Result<&Payload, Sentinel>);
}

impl<S: ?Sized, F> Render<S> for F
where
    F: Fn(&mut S, std::result::Result<&Payload, Sentinel>) + Send + Sync,
{
    fn render(&self, sink: &mut S, outcome: std::result::Result<&Payload, Sentinel>) {
        self(sink, outcome)
    }
}

pub struct Resource<S: ?Sized> {
    db: Db,
    render: Arc<dyn Render<S>>,
}

impl<S: ?Sized> Clone for Resource<S> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            render: Arc::clone(&self.render),
        }
    }
}

impl<S: ?Sized> Resource<S> {
    pub fn new(db: Db, render: impl Render<S> + 'static) -> Self {
        Self {
            db,
            render: Arc::new(render),
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    fn report(&self, sink: &mut S, outcome: Result<Payload>) {
        match outcome {
            Ok(payload) => self.render.render(sink, Ok(&payload)),
            Err(e) => self.render.render(sink, Err(Sentinel::from(&e))),
        }
    }

    /// Inserts a row of `R`'s table from `fields`. Renders the written row with its id.
    pub fn create<R: Record>(&self, sink: &mut S, fields: RowMap) {
        let outcome = self.insert::<R>(fields);
        self.report(sink, outcome);
    }

    /// Reads live rows of `R`'s table matching `fields` by equality.
    ///
    /// A key `<other>_id` that is not a column of the table is looked up
    /// through a join table `<table>_<other>` or `<other>_<table>` holding it.
    pub fn read<R: Record>(&self, sink: &mut S, fields: RowMap) {
        let outcome = self.select::<R>(fields);
        self.report(sink, outcome);
    }

    /// Updates the row whose `id` is given in `fields`.
    pub fn update<R: Record>(&self, sink: &mut S, mut fields: RowMap) {
        let outcome = take_id(&mut fields).and_then(|id| {
            self.db
                .update_map(&R::table_name(), id, fields)
                .map(|_| Payload::Done)
        });
        self.report(sink, outcome);
    }

    /// Deletes the row whose `id` is given in `fields`, softly when the table has `is_deleted`.
    pub fn delete<R: Record>(&self, sink: &mut S, mut fields: RowMap) {
        let outcome = take_id(&mut fields).and_then(|id| {
            self.db
                .delete_by_id(&R::table_name(), id)
                .map(|_| Payload::Done)
        });
        self.report(sink, outcome);
    }

    fn insert<R: Record>(&self, fields: RowMap) -> Result<Payload> {
        if fields.is_empty() {
            return Err(RowkitError::Argument("nothing to create".into()));
        }
        let table = R::table_name();
        let schema = self.db.existing_table(&table)?;
        let mut row: RowMap = fields
            .into_iter()
            .filter(|(column, _)| schema.has_column(column))
            .collect();
        let (id, written) = self.db.insert_row(&table, row.clone())?;
        row.extend(written);
        row.remove("is_deleted");
        row.insert("id", id);
        Ok(Payload::Created(row))
    }

    fn select<R: Record>(&self, fields: RowMap) -> Result<Payload> {
        let table = R::table_name();
        let schema = self.db.existing_table(&table)?;

        let mut join_table = None;
        for key in fields.keys().filter(|key| !schema.has_column(key)) {
            let found = key
                .strip_suffix("_id")
                .filter(|other| !other.is_empty())
                .and_then(|other| self.join_table(&table, other, key));
            match found {
                Some(found) => {
                    // One join table per read.
                    if let Some((_, first)) = &join_table {
                        return Err(RowkitError::Argument(format!(
                            "`{first}` and `{key}` both need a join table"
                        )));
                    }
                    join_table = Some((found, key.to_owned()));
                }
                None => {
                    return Err(RowkitError::Argument(format!(
                        "unknown column `{key}` in `{table}`"
                    )))
                }
            }
        }

        let mut predicate = Predicate::new().for_table(table.as_str());
        if let Some((join_table, _)) = &join_table {
            predicate = predicate
                .select_fields([format!("{}.*", quote_ident(&table))])
                .join(format!(
                    "LEFT JOIN {} ON {} = {}",
                    quote_ident(join_table),
                    qualify(join_table, &format!("{table}_id")),
                    qualify(&table, "id"),
                ));
        }
        for (key, value) in fields {
            let column = match &join_table {
                Some((join_table, join_key)) if *join_key == key => qualify(join_table, &key),
                _ => qualify(&table, &key),
            };
            predicate = predicate.r#where(format!("{column} = ?"), [value]);
        }
        if schema.has_column("is_deleted") {
            predicate = predicate.condition(format!("{} = 0", qualify(&table, "is_deleted")));
        }

        let (sql, args) = predicate.render()?;
        let rows = self.db.query(&sql, &args)?;
        Ok(Payload::Rows(rows.maps()))
    }

    /// `<table>_<other>` wins over `<other>_<table>`; either must hold both keys.
    fn join_table(&self, table: &str, other: &str, key: &str) -> Option<String> {
        let own_key = format!("{table}_id");
        [format!("{table}_{other}"), format!("{other}_{table}")]
            .into_iter()
            .find(|candidate| {
                let schema = self.db.columns_of(candidate);
                schema.has_column(key) && schema.has_column(&own_key)
            })
    }
}

fn take_id(fields: &mut RowMap) -> Result<Value> {
    match fields.remove("id") {
        Some(id) if !id.is_zero_key() => Ok(id),
        _ => Err(RowkitError::MissingPrimaryKey("id".into())),
    }
}
