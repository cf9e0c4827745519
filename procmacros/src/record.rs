//! `#[derive(Record)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result};

use crate::paths;

/// Struct-level `#[record(...)]` options.
#[derive(Default)]
struct RecordAttrs {
    table: Option<LitStr>,
    primary_key: Option<LitStr>,
    hooks: bool,
}

enum FieldKind {
    Column(String),
    Nested,
    Skip,
}

struct RecordField<'a> {
    ident: &'a Ident,
    kind: FieldKind,
}

fn record_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("record"))
}

fn parse_struct_attrs(attrs: &[Attribute]) -> Result<RecordAttrs> {
    let mut parsed = RecordAttrs::default();
    for attr in record_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                parsed.table = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("primary_key") {
                parsed.primary_key = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("hooks") {
                parsed.hooks = true;
            } else {
                return Err(meta.error("expected `table`, `primary_key` or `hooks`"));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

fn parse_field(field: &Field) -> Result<RecordField<'_>> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| Error::new_spanned(field, "Record fields must be named"))?;

    let mut kind = FieldKind::Column(ident.unraw().to_string());
    for attr in record_attrs(&field.attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let name: LitStr = meta.value()?.parse()?;
                kind = FieldKind::Column(name.value());
            } else if meta.path.is_ident("nested") {
                kind = FieldKind::Nested;
            } else if meta.path.is_ident("skip") {
                kind = FieldKind::Skip;
            } else {
                return Err(meta.error("expected `column`, `nested` or `skip`"));
            }
            Ok(())
        })?;
    }
    Ok(RecordField { ident, kind })
}

pub(crate) fn generate_record_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new_spanned(
                    struct_name,
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                struct_name,
                "Record can only be derived for structs",
            ))
        }
    };

    let attrs = parse_struct_attrs(&input.attrs)?;
    let fields = fields.iter().map(parse_field).collect::<Result<Vec<_>>>()?;

    let record = paths::record();
    let hooks = paths::hooks();
    let nested = paths::nested();
    let value = paths::value();
    let from_value = paths::from_value();
    let result = paths::result();
    let error = paths::error();

    let type_name = struct_name.to_string();
    let table = attrs.table.map(|table| {
        quote! { const TABLE: ::std::option::Option<&'static str> = ::std::option::Option::Some(#table); }
    });
    let primary_key = attrs.primary_key.map(|pk| {
        quote! { const PRIMARY_KEY: &'static str = #pk; }
    });

    let columns: Vec<(&Ident, &String)> = fields
        .iter()
        .filter_map(|field| match &field.kind {
            FieldKind::Column(column) => Some((field.ident, column)),
            _ => None,
        })
        .collect();
    let column_names = columns.iter().map(|(_, column)| column);

    let get_arms = columns.iter().map(|(ident, column)| {
        quote! {
            #column => ::std::option::Option::Some(#value::from(::std::clone::Clone::clone(&self.#ident))),
        }
    });
    let set_arms = columns.iter().map(|(ident, column)| {
        quote! {
            #column => {
                self.#ident = #from_value::from_value(value).map_err(|e| {
                    #error::Conversion(::std::format!("{}.{}: {}", #type_name, #column, e))
                })?;
                ::std::result::Result::Ok(true)
            }
        }
    });

    let nested_fields: Vec<&Ident> = fields
        .iter()
        .filter(|field| matches!(field.kind, FieldKind::Nested))
        .map(|field| field.ident)
        .collect();
    let nested_impl = (!nested_fields.is_empty()).then(|| {
        quote! {
            fn nested(&mut self) -> ::std::vec::Vec<&mut dyn #nested> {
                ::std::vec![#(&mut self.#nested_fields as &mut dyn #nested),*]
            }
        }
    });

    let hooks_impl = attrs.hooks.then(|| {
        quote! {
            fn hooks(&mut self) -> ::std::option::Option<&mut dyn #hooks> {
                ::std::option::Option::Some(self)
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #record for #struct_name #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #type_name;
            #table
            const COLUMNS: &'static [&'static str] = &[#(#column_names),*];
            #primary_key

            fn get(&self, column: &str) -> ::std::option::Option<#value> {
                match column {
                    #(#get_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set(&mut self, column: &str, value: #value) -> #result<bool> {
                match column {
                    #(#set_arms)*
                    _ => ::std::result::Result::Ok(false),
                }
            }

            #nested_impl
            #hooks_impl
        }
    })
}
