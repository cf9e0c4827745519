extern crate proc_macro;

mod paths;
mod record;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `rowkit::Record` for a struct with named fields.
///
/// The table name defaults to the struct name translated to snake case
/// (`QuestionOption` -> `question_option`) and each field maps to the column
/// of the same name.
///
/// Struct attributes:
/// - `#[record(table = "name")]` overrides the table name
/// - `#[record(primary_key = "column")]` overrides the `id` primary key
/// - `#[record(hooks)]` routes lifecycle callbacks to the type's `Hooks` impl
///
/// Field attributes:
/// - `#[record(column = "name")]` maps the field to another column
/// - `#[record(nested)]` marks a record, `Vec` or `Option` field for eager loading
/// - `#[record(skip)]` leaves the field out of reads and writes
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Default, Record)]
/// #[record(hooks)]
/// struct Question {
///     id: i64,
///     title: String,
///     #[record(nested)]
///     options: Vec<QuestionOption>,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record::generate_record_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
