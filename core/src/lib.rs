//! Core of rowkit: the value model, schema catalog, predicate builder,
//! relationship resolver, connection pool and the `Db` handle.
//!
//! Drivers and the `#[derive(Record)]` macro live in the `rowkit` facade crate.

#[macro_use]
pub mod tracing;

pub mod config;
pub mod connection;
pub mod crud;
pub mod db;
pub mod dialect;
pub mod eager;
pub mod error;
pub mod naming;
pub mod pool;
pub mod predicate;
pub mod record;
pub mod relation;
pub mod resource;
pub mod row;
pub mod schema;
pub mod value;

pub use config::{DbConfig, PoolConfig};
pub use connection::{Connection, Connector, ExecResult};
pub use crud::{BatchOutcome, Filter};
pub use db::Db;
pub use eager::{Nested, Target};
pub use error::{Result, RowkitError};
pub use naming::{to_db_name, to_struct_name};
pub use pool::{Pool, PoolStatus, PooledConnection};
pub use predicate::Predicate;
pub use record::{Hooks, Record};
pub use relation::{Link, Relation};
pub use resource::{Payload, Render, Resource, Sentinel};
pub use row::{Row, RowMap, Rows};
pub use schema::{Column, DataType, SchemaCatalog, SchemaLookup, TableSchema};
pub use value::{FromValue, Value};
