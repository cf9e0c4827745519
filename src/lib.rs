//! # rowkit
//!
//! Schema-aware record access for MySQL. Tables are introspected on first
//! use, records map onto them through `#[derive(Record)]`, and nested fields
//! are filled by relationships inferred from column naming conventions.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rowkit::prelude::*;
//!
//! #[derive(Debug, Default, Record)]
//! struct QuestionOption {
//!     id: i64,
//!     question_id: i64,
//!     label: String,
//! }
//!
//! #[derive(Debug, Default, Record)]
//! struct Question {
//!     id: i64,
//!     title: String,
//!     #[record(nested)]
//!     options: Vec<QuestionOption>,
//! }
//!
//! # fn main() -> rowkit::Result<()> {
//! let db = rowkit::driver::rusqlite::open("app.db", DbConfig::default())?;
//!
//! let mut question = Question::default();
//! db.load_all(&mut question, Filter::id(1))?;
//!
//! let open: u64 = db.table("question").r#where("`title` LIKE ?", ["%rust%"]).count()?;
//! # let _ = open;
//! # Ok(())
//! # }
//! ```
//!
//! ## Drivers
//!
//! | Database | Driver   | Feature Flag |
//! |----------|----------|--------------|
//! | MySQL    | mysql    | `mysql`      |
//! | SQLite   | rusqlite | `rusqlite`   |

pub mod driver;

pub use rowkit_core::*;

/// `#[derive(Record)]`
pub use rowkit_macros::Record;

pub mod prelude {
    pub use crate::Record;
    pub use rowkit_core::{
        BatchOutcome, Db, DbConfig, Filter, Hooks, PoolConfig, Predicate, RowMap, RowkitError,
        Value,
    };
}
