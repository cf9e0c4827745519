//! Eager loading of nested records.
//!
//! After the primary load, every `#[record(nested)]` field of every loaded
//! record is filled by resolving the relationship between the field's element
//! table and the owner's table, then loading recursively with the link query.
//! Fields are visited depth-first in declaration order.

use crate::crud::Filter;
use crate::db::Db;
use crate::error::Result;
use crate::record::Record;
use crate::relation::Link;

/// Something rows can be loaded into: a single record, a `Vec` of records or
/// an optional record.
pub trait Target {
    type Item: Record;

    /// Replaces the content with `items`. A single record takes the first item
    /// and is left untouched when `items` is empty.
    fn replace(&mut self, items: Vec<Self::Item>);

    fn items_mut(&mut self) -> Vec<&mut Self::Item>;
}

impl<R: Record> Target for R {
    type Item = R;

    fn replace(&mut self, items: Vec<R>) {
        if let Some(first) = items.into_iter().next() {
            *self = first;
        }
    }

    fn items_mut(&mut self) -> Vec<&mut R> {
        vec![self]
    }
}

impl<R: Record> Target for Vec<R> {
    type Item = R;

    fn replace(&mut self, items: Vec<R>) {
        *self = items;
    }

    fn items_mut(&mut self) -> Vec<&mut R> {
        self.iter_mut().collect()
    }
}

impl<R: Record> Target for Option<R> {
    type Item = R;

    fn replace(&mut self, items: Vec<R>) {
        *self = items.into_iter().next();
    }

    fn items_mut(&mut self) -> Vec<&mut R> {
        self.iter_mut().collect()
    }
}

/// Object-safe view of a nested field, as returned by [`Record::nested`].
pub trait Nested {
    /// Table of the field's element record type.
    fn element_table(&self) -> String;

    /// Loads the field from `link`, recursing into its own nested fields.
    /// `path` holds the tables of the enclosing records.
    fn load_link(&mut self, db: &Db, link: Link, path: &mut Vec<String>) -> Result<usize>;
}

impl<T: Target> Nested for T {
    fn element_table(&self) -> String {
        T::Item::table_name()
    }

    fn load_link(&mut self, db: &Db, link: Link, path: &mut Vec<String>) -> Result<usize> {
        db.load_tree(self, Filter::Query(link.into_predicate()), path)
    }
}

impl Db {
    /// Loads `target` like [`Db::find`], then fills its nested fields.
    ///
    /// A nested field whose element table already encloses it is skipped, and
    /// nesting stops at [`DbConfig::max_depth`](crate::DbConfig) levels.
    pub fn load_all<T: Target>(&self, target: &mut T, filter: Filter) -> Result<usize> {
        let mut path = Vec::new();
        self.load_tree(target, filter, &mut path)
    }

    fn load_tree<T: Target>(
        &self,
        target: &mut T,
        filter: Filter,
        path: &mut Vec<String>,
    ) -> Result<usize> {
        let loaded = self.find(target, filter)?;
        if loaded == 0 || path.len() >= self.config().max_depth {
            return Ok(loaded);
        }

        path.push(T::Item::table_name());
        let nested = target
            .items_mut()
            .into_iter()
            .try_for_each(|item| self.load_nested(item, path));
        path.pop();
        nested.map(|()| loaded)
    }

    fn load_nested<R: Record>(&self, record: &mut R, path: &mut Vec<String>) -> Result<()> {
        let tables: Vec<String> = record
            .nested()
            .iter()
            .map(|field| field.element_table())
            .collect();
        if tables.is_empty() {
            return Ok(());
        }

        let mut links = Vec::with_capacity(tables.len());
        for table in &tables {
            if path.contains(table) {
                crate::rowkit_debug!(table = %table, "skipping nested table already on the load path");
                links.push(None);
                continue;
            }
            match self.resolve(table, record) {
                Ok(link) => links.push(Some(link)),
                Err(e) if e.is_not_found_relation() => links.push(None),
                Err(e) => return Err(e),
            }
        }

        for (field, link) in record.nested().into_iter().zip(links) {
            if let Some(link) = link {
                field.load_link(self, link, path)?;
            }
        }
        Ok(())
    }
}
