//! PascalCase <-> snake_case translation for type and table names.
//!
//! Forward translation is computed and memoized in a process-wide [`NameCache`].
//! There is no generic snake_case -> PascalCase algorithm: reverse lookup only
//! answers for names that were translated forward before.

use std::sync::{LazyLock, PoisonError, RwLock};

use hashbrown::HashMap;

/// Upper-case runs kept together as a single lower-cased segment.
pub const ACRONYMS: &[&str] = &[
    "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID", "IP",
    "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SSH", "TLS", "TTL", "UI", "UID",
    "UUID", "URI", "URL", "UTF8", "VM", "XML", "XSRF", "XSS", "PY",
];

static NAMES: LazyLock<NameCache> = LazyLock::new(NameCache::new);

/// Translates a struct or type name into its database name, e.g. `UserID` -> `user_id`.
pub fn to_db_name(name: &str) -> String {
    NAMES.to_db_name(name)
}

/// Returns the struct name that was translated into `db_name`, if any.
pub fn to_struct_name(db_name: &str) -> Option<String> {
    NAMES.to_struct_name(db_name)
}

#[derive(Debug, Default)]
struct Names {
    to_db: HashMap<String, String>,
    to_struct: HashMap<String, String>,
}

/// Bidirectional memo of computed translations.
///
/// Both directions are written under one write lock so a reader never sees a
/// forward entry without its reverse.
#[derive(Debug, Default)]
pub struct NameCache {
    names: RwLock<Names>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_db_name(&self, name: &str) -> String {
        if let Some(hit) = self
            .names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_db
            .get(name)
        {
            return hit.clone();
        }

        let db_name = translate(name);
        if !db_name.is_empty() {
            let mut names = self.names.write().unwrap_or_else(PoisonError::into_inner);
            names.to_db.insert(name.to_owned(), db_name.clone());
            // An already-snake name maps onto itself and must not shadow the
            // struct name recorded for it.
            if db_name != name {
                names.to_struct.insert(db_name.clone(), name.to_owned());
            }
        }
        db_name
    }

    pub fn to_struct_name(&self, db_name: &str) -> Option<String> {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_struct
            .get(db_name)
            .cloned()
    }

    /// Number of memoized translations.
    pub fn len(&self) -> usize {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_db
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn translate(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut rest = name;

    while let Some(c) = rest.chars().next() {
        if c.is_ascii_uppercase() {
            let segment = acronym_at(rest).unwrap_or(&rest[..1]);
            out.push('_');
            out.push_str(&segment.to_ascii_lowercase());
            rest = &rest[segment.len()..];
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }

    match out.strip_prefix('_') {
        Some(stripped) => stripped.to_owned(),
        None => out,
    }
}

/// Longest acronym at the start of `input`, preferring one that ends on a word boundary.
fn acronym_at(input: &str) -> Option<&str> {
    let on_boundary = |acronym: &&str| {
        input[acronym.len()..]
            .chars()
            .next()
            .is_none_or(|next| !next.is_ascii_lowercase())
    };

    let candidates = || ACRONYMS.iter().filter(|a| input.starts_with(**a));
    candidates()
        .filter(|a| on_boundary(*a))
        .max_by_key(|a| a.len())
        .or_else(|| candidates().max_by_key(|a| a.len()))
        .map(|a| &input[..a.len()])
}
