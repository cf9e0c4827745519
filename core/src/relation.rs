//! Convention-based relationship inference.
//!
//! Given a target table and a known table, [`resolve`] applies four rules in a
//! fixed order and returns the first match:
//!
//! 1. the known table has `<target>_id` ([`Relation::BelongsTo`]),
//! 2. the target table has `<known>_id` ([`Relation::HasMany`]),
//! 3. a join table `<target>_<known>`, else `<known>_<target>`, has both
//!    `<known>_id` and `<target>_id` ([`Relation::ManyToMany`]),
//! 4. otherwise there is no relation.
//!
//! A schema satisfying both rule 1 and rule 3 always resolves through rule 1.

use crate::dialect::{qualify, quote_ident};
use crate::predicate::Predicate;
use crate::schema::SchemaLookup;
use crate::value::Value;

/// How a target table relates to a known one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// The known row holds `foreign_key` pointing at `target.id`.
    BelongsTo { foreign_key: String },
    /// Target rows hold `foreign_key` pointing at `known.id`.
    HasMany { foreign_key: String },
    /// Rows of `join_table` pair `known_key` with `target_key`.
    ManyToMany {
        join_table: String,
        known_key: String,
        target_key: String,
    },
}

/// Infers the relation between `target` and `known` from naming convention.
pub fn resolve(target: &str, known: &str, schema: &impl SchemaLookup) -> Option<Relation> {
    let target_key = format!("{target}_id");
    let known_key = format!("{known}_id");

    if schema.has_column(known, &target_key) {
        return Some(Relation::BelongsTo {
            foreign_key: target_key,
        });
    }

    if schema.has_column(target, &known_key) {
        return Some(Relation::HasMany {
            foreign_key: known_key,
        });
    }

    [format!("{target}_{known}"), format!("{known}_{target}")]
        .into_iter()
        .find(|join_table| {
            schema.has_table(join_table)
                && schema.has_column(join_table, &known_key)
                && schema.has_column(join_table, &target_key)
        })
        .map(|join_table| Relation::ManyToMany {
            join_table,
            known_key,
            target_key,
        })
}

impl Relation {
    /// Column of the known record whose value is bound into the query.
    pub fn bound_column(&self) -> &str {
        match self {
            Relation::BelongsTo { foreign_key } => foreign_key,
            Relation::HasMany { .. } | Relation::ManyToMany { .. } => "id",
        }
    }

    /// Query selecting the related rows of `target`, with one `?` for the bound value.
    pub fn predicate(&self, target: &str, value: Value) -> Predicate {
        let base = Predicate::new().for_table(target);
        match self {
            Relation::BelongsTo { .. } => base.r#where(format!("{} = ?", quote_ident("id")), [value]),
            Relation::HasMany { foreign_key } => {
                base.r#where(format!("{} = ?", quote_ident(foreign_key)), [value])
            }
            Relation::ManyToMany {
                join_table,
                known_key,
                target_key,
            } => base
                .select_fields([format!("{}.*", quote_ident(target))])
                .join(format!(
                    "LEFT JOIN {} ON {} = {}",
                    quote_ident(join_table),
                    qualify(join_table, target_key),
                    qualify(target, "id"),
                ))
                .r#where(format!("{} = ?", qualify(join_table, known_key)), [value]),
        }
    }

    /// Binds the relation to a concrete value, producing a runnable [`Link`].
    pub fn link(self, target: &str, value: Value) -> Link {
        let predicate = self.predicate(target, value.clone());
        Link {
            relation: self,
            predicate,
            value,
        }
    }
}

/// A resolved relationship query plus the single value bound into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub relation: Relation,
    pub predicate: Predicate,
    pub value: Value,
}

impl Link {
    pub fn into_predicate(self) -> Predicate {
        self.predicate
    }
}
