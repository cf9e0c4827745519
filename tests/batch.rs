#![cfg(feature = "rusqlite")]

mod common;

use common::{Member, Question, seed_section, setup_db};
use rowkit::prelude::*;

fn member(name: &str) -> Member {
    Member {
        name: name.into(),
        ..Default::default()
    }
}

#[test]
fn creates_stops_at_the_first_failure() {
    let (_dir, db) = setup_db();

    // `name` is unique, so the third insert fails.
    let mut members = vec![member("ana"), member("bo"), member("ana"), member("cy")];
    let outcome = db.creates(&mut members);

    assert_eq!(outcome.completed, [1, 2]);
    assert!(matches!(outcome.error, Some(RowkitError::Execution(_))));
    assert!(!outcome.is_complete());

    assert_eq!(members[0].id, 1);
    assert_eq!(members[1].id, 2);
    assert_eq!(members[3].id, 0, "elements after the failure are not processed");

    let names: Vec<String> = db
        .table("member")
        .fields(["name"])
        .maps()
        .unwrap()
        .iter()
        .map(|m| m.string("name"))
        .collect();
    assert_eq!(names, ["ana", "bo"]);
}

#[test]
fn creates_completes_every_element() {
    let (_dir, db) = setup_db();

    let mut members = vec![member("ana"), member("bo"), member("cy")];
    let ids = db.creates(&mut members).into_result().unwrap();

    assert_eq!(ids, [1, 2, 3]);
    assert!(members.iter().zip(1..).all(|(m, id)| m.id == id));
}

#[test]
fn updates_reports_per_element_counts() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 3);

    let mut questions: Vec<Question> = Vec::new();
    db.find(&mut questions, Filter::All).unwrap();
    for question in &mut questions {
        question.title.push_str(" (edited)");
    }

    let outcome = db.updates(&mut questions);
    assert!(outcome.is_complete());
    assert_eq!(outcome.completed, [1, 1, 1]);
    assert_eq!(outcome.affected(), 3);

    let edited = db
        .table("question")
        .r#where("`title` LIKE ?", ["%(edited)"])
        .count()
        .unwrap();
    assert_eq!(edited, 3);
}

#[test]
fn deletes_aborts_on_a_missing_key() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 2);

    let mut questions: Vec<Question> = Vec::new();
    db.find(&mut questions, Filter::All).unwrap();
    questions.insert(1, Question::default());

    let outcome = db.deletes(&mut questions);
    assert_eq!(outcome.completed, [1]);
    assert_eq!(outcome.affected(), 1);
    assert!(matches!(
        outcome.error,
        Some(RowkitError::MissingPrimaryKey(_))
    ));
    assert_eq!(questions[0].is_deleted, 1);
    assert_eq!(questions[2].is_deleted, 0);
}
