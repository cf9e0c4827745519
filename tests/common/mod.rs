#![cfg(feature = "rusqlite")]
#![allow(dead_code)]

use rowkit::prelude::*;
use rowkit::{Hooks, Result};
use tempfile::TempDir;

const SCHEMA: &[&str] = &[
    "CREATE TABLE section (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE question (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL DEFAULT '',
        section_id INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        deleted_at TEXT
    )",
    "CREATE TABLE question_option (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_id INTEGER NOT NULL,
        label TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE team (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE team_section (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        team_id INTEGER NOT NULL,
        section_id INTEGER NOT NULL
    )",
    "CREATE TABLE member (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )",
];

/// A fresh file-backed database with the test schema. Keep the `TempDir`
/// alive for as long as the `Db` is used.
pub fn setup_db() -> (TempDir, Db) {
    init_tracing();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = rowkit::driver::rusqlite::open(dir.path().join("test.db"), DbConfig::default())
        .expect("Failed to open database");
    for statement in SCHEMA {
        db.exec(statement, &[]).expect("Failed to create table");
    }
    (dir, db)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Inserts a section, `count` questions in it and two options per question.
pub fn seed_section(db: &Db, name: &str, count: usize) -> i64 {
    let section_id = db
        .insert_map("section", RowMap::new().with("name", name))
        .unwrap() as i64;
    for n in 0..count {
        let question_id = db
            .insert_map(
                "question",
                RowMap::new()
                    .with("title", format!("{name} q{n}"))
                    .with("section_id", section_id),
            )
            .unwrap();
        for label in ["yes", "no"] {
            db.insert_map(
                "question_option",
                RowMap::new()
                    .with("question_id", question_id)
                    .with("label", label),
            )
            .unwrap();
        }
    }
    section_id
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Section {
    pub id: i64,
    pub name: String,
    #[record(nested)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[record(hooks)]
pub struct Question {
    pub id: i64,
    pub title: String,
    pub section_id: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub is_deleted: i64,
    pub deleted_at: Option<String>,
    #[record(nested)]
    pub options: Vec<QuestionOption>,
    #[record(nested)]
    pub section: Option<Section>,
    /// Number of `after_find` calls
    #[record(skip)]
    pub found: u32,
}

impl Hooks for Question {
    fn before_create(&mut self) -> Result<()> {
        if self.title.is_empty() {
            return Err(RowkitError::Argument("question needs a title".into()));
        }
        Ok(())
    }

    fn after_find(&mut self) -> Result<()> {
        self.found += 1;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub label: String,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[record(nested)]
    pub sections: Vec<Section>,
    /// No column or join table links `member` to `team`.
    #[record(nested)]
    pub members: Vec<Member>,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Member {
    pub id: i64,
    pub name: String,
}

/// Same table as [`Member`] through explicit mappings.
#[derive(Debug, Default, Clone, PartialEq, Record)]
#[record(table = "member", primary_key = "id")]
pub struct Person {
    pub id: i64,
    #[record(column = "name")]
    pub full_name: String,
}
