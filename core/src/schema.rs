//! Schema catalog: lazily populated column metadata per table.
//!
//! The catalog is the source of truth for "does this table/column exist". It is
//! filled on first reference to a table and never invalidated. A table whose
//! introspection failed or returned nothing is cached as an empty schema, so
//! every membership test against it reports false without another round-trip.

use std::sync::{Arc, PoisonError, RwLock};

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::error::Result;

/// Normalized class of a column's SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Decimal,
    Float,
    Text,
    Binary,
    Temporal,
    Json,
    Enum,
    Bit,
    Other,
}

impl DataType {
    /// Classifies a type name such as `bigint`, `VARCHAR(32)` or `double unsigned`.
    pub fn from_sql(type_name: &str) -> Self {
        let base = type_name
            .split(['(', ' '])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match base.as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "bool"
            | "boolean" | "serial" => DataType::Integer,
            "decimal" | "numeric" | "dec" | "fixed" => DataType::Decimal,
            "float" | "double" | "real" => DataType::Float,
            "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "clob" => {
                DataType::Text
            }
            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
                DataType::Binary
            }
            "date" | "datetime" | "timestamp" | "time" | "year" => DataType::Temporal,
            "json" => DataType::Json,
            "enum" | "set" => DataType::Enum,
            "bit" => DataType::Bit,
            _ => DataType::Other,
        }
    }
}

/// Metadata for one column. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: CompactString,
    pub comment: String,
    /// Raw type as reported by the server, e.g. `int(10) unsigned`
    pub column_type: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: &str, column_type: &str) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            column_type: column_type.to_owned(),
            data_type: DataType::from_sql(column_type),
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Columns of one table, in ordinal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<Column>,
    index: HashMap<CompactString, usize>,
}

impl TableSchema {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let columns: Vec<Column> = columns.into_iter().collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { columns, index }
    }

    /// An empty schema stands for a table that does not exist.
    pub fn exists(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Read-only view of table/column existence, as consumed by the relationship resolver.
pub trait SchemaLookup {
    fn has_table(&self, table: &str) -> bool;
    fn has_column(&self, table: &str, column: &str) -> bool;
}

/// Process-lifetime cache of table schemas.
///
/// Concurrent first access to the same table may fetch twice; the last insert
/// wins and both results describe the same table.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    tables: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached schema, without populating.
    pub fn get(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
    }

    pub fn insert(&self, table: &str, schema: TableSchema) -> Arc<TableSchema> {
        let schema = Arc::new(schema);
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.to_owned(), Arc::clone(&schema));
        schema
    }

    /// Returns the cached schema, or runs `fetch` once and caches its outcome.
    /// A failed fetch is logged and cached as an empty schema.
    pub fn get_or_populate<F>(&self, table: &str, fetch: F) -> Arc<TableSchema>
    where
        F: FnOnce(&str) -> Result<Vec<Column>>,
    {
        if let Some(schema) = self.get(table) {
            return schema;
        }

        let schema = match fetch(table) {
            Ok(columns) => TableSchema::new(columns),
            Err(e) => {
                crate::rowkit_warn!(table, error = %e, "rowkit.catalog: introspection failed");
                TableSchema::default()
            }
        };
        if !schema.exists() {
            crate::rowkit_debug!(table, "rowkit.catalog: table not found");
        }
        self.insert(table, schema)
    }

    /// Names of all cached tables, including ones cached as absent.
    pub fn tables(&self) -> Vec<String> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cached-only view: tables never populated read as absent.
impl SchemaLookup for SchemaCatalog {
    fn has_table(&self, table: &str) -> bool {
        self.get(table).is_some_and(|s| s.exists())
    }

    fn has_column(&self, table: &str, column: &str) -> bool {
        self.get(table).is_some_and(|s| s.has_column(column))
    }
}
