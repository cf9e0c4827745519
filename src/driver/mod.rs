//! Driver implementations of the [`Connection`](crate::Connection) boundary.
//!
//! Each driver exposes an `open` helper returning a ready [`Db`](crate::Db).

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "rusqlite")]
pub mod rusqlite;
