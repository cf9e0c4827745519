//! MySQL dialect details: identifier quoting and catalog introspection.

use crate::row::Rows;
use crate::schema::{Column, DataType};

/// Introspection statement for one table of the current database.
pub const COLUMNS_QUERY: &str = "SELECT COLUMN_NAME, COLUMN_COMMENT, COLUMN_TYPE, DATA_TYPE, IS_NULLABLE \
     FROM information_schema.`COLUMNS` \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION";

/// Quotes an identifier with backticks, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for c in name.chars() {
        if c == '`' {
            quoted.push('`');
        }
        quoted.push(c);
    }
    quoted.push('`');
    quoted
}

/// Quotes `table`.`column`.
pub fn qualify(table: &str, column: &str) -> String {
    format!("{}.{}", quote_ident(table), quote_ident(column))
}

/// True for names made only of ASCII alphanumerics and underscores.
pub fn is_plain_ident(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builds catalog columns from the rows of [`COLUMNS_QUERY`].
pub fn columns_from_rows(rows: &Rows) -> Vec<Column> {
    rows.iter()
        .filter_map(|row| {
            let name: String = row.get_as("COLUMN_NAME").ok()?;
            let data_type: String = row.get_as("DATA_TYPE").unwrap_or_default();
            let nullable: String = row.get_as("IS_NULLABLE").unwrap_or_default();
            Some(Column {
                name: name.into(),
                comment: row.get_as("COLUMN_COMMENT").unwrap_or_default(),
                column_type: row.get_as("COLUMN_TYPE").unwrap_or_default(),
                data_type: DataType::from_sql(&data_type),
                nullable: nullable.eq_ignore_ascii_case("YES"),
            })
        })
        .collect()
}
