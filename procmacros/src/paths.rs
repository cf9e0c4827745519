//! Centralized path definitions for generated code.
//!
//! Paths use the `rowkit::` prefix without a leading `::`, so a crate can
//! provide a `mod rowkit { ... }` shim that re-exports the core types.

use proc_macro2::TokenStream;
use quote::quote;

pub fn record() -> TokenStream {
    quote!(rowkit::Record)
}

pub fn hooks() -> TokenStream {
    quote!(rowkit::Hooks)
}

pub fn nested() -> TokenStream {
    quote!(rowkit::Nested)
}

pub fn value() -> TokenStream {
    quote!(rowkit::Value)
}

pub fn from_value() -> TokenStream {
    quote!(rowkit::FromValue)
}

pub fn result() -> TokenStream {
    quote!(rowkit::Result)
}

pub fn error() -> TokenStream {
    quote!(rowkit::RowkitError)
}
