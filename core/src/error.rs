use thiserror::Error;

#[derive(Debug, Error)]
pub enum RowkitError {
    /// Invalid or empty caller filter, wrong record shape, unknown table or column
    #[error("Argument error: {0}")]
    Argument(String),

    /// Failure reported by the driver while running a statement
    #[error("Execution error: {0}")]
    Execution(String),

    /// No naming convention links the two tables. A negative result, not a failure.
    #[error("No relation between `{target}` and `{known}`")]
    NotFoundRelation { target: String, known: String },

    /// Write or delete without a usable primary key
    #[error("Missing primary key for `{0}`")]
    MissingPrimaryKey(String),

    /// Error converting a value read from a row
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Connection could not be opened or leased
    #[error("Pool error: {0}")]
    Pool(String),
}

impl RowkitError {
    /// Returns true for the resolver's "no relation" outcome.
    pub fn is_not_found_relation(&self) -> bool {
        matches!(self, RowkitError::NotFoundRelation { .. })
    }

    /// Returns true when the error came from the driver or the pool.
    pub fn is_execution(&self) -> bool {
        matches!(self, RowkitError::Execution(_) | RowkitError::Pool(_))
    }
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, RowkitError>;
