#![cfg(feature = "rusqlite")]

mod common;

use common::{Member, Person, Question, seed_section, setup_db};
use rowkit::prelude::*;

#[test]
fn find_by_id_loads_the_row() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 2);

    let mut question = Question::default();
    let loaded = db.find(&mut question, Filter::id(2)).unwrap();

    assert_eq!(loaded, 1);
    assert_eq!(question.id, 2);
    assert_eq!(question.title, "intro q1");
    assert_eq!(question.found, 1, "after_find runs once per loaded record");
    assert!(question.options.is_empty(), "find does not eager load");
}

#[test]
fn find_without_match_leaves_record_untouched() {
    let (_dir, db) = setup_db();

    let mut question = Question {
        title: "draft".into(),
        ..Default::default()
    };
    let loaded = db.find(&mut question, Filter::id(42)).unwrap();

    assert_eq!(loaded, 0);
    assert_eq!(question.id, 0);
    assert_eq!(question.title, "draft");
    assert_eq!(question.found, 0);
}

#[test]
fn find_into_collections() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 3);

    let mut all: Vec<Question> = Vec::new();
    assert_eq!(db.find(&mut all, Filter::All).unwrap(), 3);
    assert!(all.iter().all(|q| q.found == 1));

    let mut maybe: Option<Question> = None;
    db.find(&mut maybe, Filter::id(3)).unwrap();
    assert_eq!(maybe.map(|q| q.title).as_deref(), Some("intro q2"));

    let mut none: Option<Question> = Some(Question::default());
    db.find(&mut none, Filter::id(99)).unwrap();
    assert!(none.is_none());
}

#[test]
fn find_where_tolerates_leading_and() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 3);

    let mut questions: Vec<Question> = Vec::new();
    db.find(
        &mut questions,
        Filter::r#where("AND `title` LIKE ? AND `id` > ?", ["intro%".into(), Value::Int(1)]),
    )
    .unwrap();

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, [2, 3]);
}

#[test]
fn or_fragment_still_skips_soft_deleted_rows() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 3);
    db.delete_by_id("question", 1).unwrap();

    let mut questions: Vec<Question> = Vec::new();
    db.find(
        &mut questions,
        Filter::r#where("(`id` = ?) OR (`id` = ?)", [1, 2]),
    )
    .unwrap();

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, [2]);
}

#[test]
fn empty_where_is_an_argument_error() {
    let (_dir, db) = setup_db();

    let mut questions: Vec<Question> = Vec::new();
    let err = db
        .find(&mut questions, Filter::r#where("  ", Vec::<Value>::new()))
        .unwrap_err();
    assert!(matches!(err, RowkitError::Argument(_)));

    let err = db
        .find(&mut questions, Filter::r#where("AND", Vec::<Value>::new()))
        .unwrap_err();
    assert!(matches!(err, RowkitError::Argument(_)));
}

#[test]
fn raw_filter_runs_as_given() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 2);
    db.exec("UPDATE `question` SET `is_deleted` = 1 WHERE `id` = 1", &[])
        .unwrap();

    let mut questions: Vec<Question> = Vec::new();
    db.find(
        &mut questions,
        Filter::raw("SELECT * FROM `question` ORDER BY `id` DESC", Vec::<Value>::new()),
    )
    .unwrap();

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, [2, 1], "raw statements see soft-deleted rows");
}

#[test]
fn create_sets_id_and_timestamps() {
    let (_dir, db) = setup_db();

    let mut question = Question {
        title: "What is ownership?".into(),
        ..Default::default()
    };
    let id = db.create(&mut question).unwrap();

    assert_eq!(id, 1);
    assert_eq!(question.id, 1);
    assert_eq!(question.is_deleted, 0);
    assert!(question.created_at.is_some());
    assert_eq!(question.created_at, question.updated_at);

    let mut stored = Question::default();
    db.find(&mut stored, Filter::id(1)).unwrap();
    assert_eq!(stored.title, "What is ownership?");
    assert_eq!(stored.created_at, question.created_at);
}

#[test]
fn create_hook_can_reject() {
    let (_dir, db) = setup_db();

    let mut untitled = Question::default();
    let err = db.create(&mut untitled).unwrap_err();

    assert!(matches!(err, RowkitError::Argument(_)));
    assert_eq!(db.table("question").count().unwrap(), 0);
}

#[test]
fn update_writes_columns_and_touches_updated_at() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 1);

    let mut question = Question::default();
    db.find(&mut question, Filter::id(1)).unwrap();
    question.title = "renamed".into();
    question.updated_at = None;

    assert_eq!(db.update(&mut question).unwrap(), 1);
    assert!(question.updated_at.is_some());

    let title = db
        .table("question")
        .fields(["title"])
        .r#where("`id` = ?", [1])
        .string(None)
        .unwrap();
    assert_eq!(title, "renamed");
}

#[test]
fn update_and_delete_need_a_primary_key() {
    let (_dir, db) = setup_db();

    let mut question = Question {
        title: "no id".into(),
        ..Default::default()
    };
    assert!(matches!(
        db.update(&mut question).unwrap_err(),
        RowkitError::MissingPrimaryKey(_)
    ));
    assert!(matches!(
        db.delete(&mut question).unwrap_err(),
        RowkitError::MissingPrimaryKey(_)
    ));
}

#[test]
fn delete_is_soft_when_the_table_has_is_deleted() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 2);

    let mut question = Question::default();
    db.find(&mut question, Filter::id(1)).unwrap();
    assert_eq!(db.delete(&mut question).unwrap(), 1);

    assert_eq!(question.is_deleted, 1);
    assert!(question.deleted_at.is_some());

    let rows = db.query("SELECT * FROM `question` WHERE `id` = 1", &[]).unwrap();
    assert_eq!(rows.len(), 1, "the row is kept");
    let row = rows.get(0).unwrap();
    assert_eq!(row.get_as::<i64>("is_deleted").unwrap(), 1);
    assert!(row.get_as::<Option<String>>("deleted_at").unwrap().is_some());

    let mut again = Question::default();
    assert_eq!(db.find(&mut again, Filter::id(1)).unwrap(), 0);
    assert_eq!(db.table("question").count().unwrap(), 2);
    let live = db.table("question").r#where("`is_deleted` = ?", [0]);
    assert_eq!(live.count().unwrap(), 1);
}

#[test]
fn delete_is_physical_without_is_deleted() {
    let (_dir, db) = setup_db();

    let mut member = Member {
        name: "ana".into(),
        ..Default::default()
    };
    db.create(&mut member).unwrap();
    assert_eq!(db.delete(&mut member).unwrap(), 1);

    let rows = db.query("SELECT * FROM `member`", &[]).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn explicit_table_and_column_mapping() {
    let (_dir, db) = setup_db();

    let mut person = Person {
        full_name: "Grace Hopper".into(),
        ..Default::default()
    };
    db.create(&mut person).unwrap();

    let mut member = Member::default();
    db.find(&mut member, Filter::id(person.id)).unwrap();
    assert_eq!(member.name, "Grace Hopper");

    let mut people: Vec<Person> = Vec::new();
    db.find(&mut people, Filter::All).unwrap();
    assert_eq!(people, [person]);
}

#[test]
fn map_writes_drop_unknown_columns() {
    let (_dir, db) = setup_db();

    let id = db
        .insert_map(
            "question",
            RowMap::new().with("title", "mapped").with("not_a_column", 1),
        )
        .unwrap();
    let stored = db
        .table("question")
        .r#where("`id` = ?", [id])
        .first_map()
        .unwrap()
        .unwrap();
    assert_eq!(stored.string("title"), "mapped");
    assert_eq!(stored.get("is_deleted"), Some(&Value::Int(0)));
    assert!(!stored.string("created_at").is_empty());

    let affected = db
        .update_map("question", id, RowMap::new().with("title", "remapped"))
        .unwrap();
    assert_eq!(affected, 1);

    let err = db
        .update_map("question", id, RowMap::new().with("bogus", 1))
        .unwrap_err();
    assert!(matches!(err, RowkitError::Argument(_)));

    assert_eq!(db.delete_by_id("question", id).unwrap(), 1);
    let live = db.table("question").r#where("`is_deleted` = ?", [0]);
    assert_eq!(live.count().unwrap(), 0);
}

#[test]
fn unknown_table_is_an_argument_error() {
    let (_dir, db) = setup_db();

    let err = db
        .insert_map("nowhere", RowMap::new().with("a", 1))
        .unwrap_err();
    assert!(matches!(err, RowkitError::Argument(_)));
    assert!(!db.has_table("nowhere"));
}
