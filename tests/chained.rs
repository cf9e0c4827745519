#![cfg(feature = "rusqlite")]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use common::{Question, seed_section, setup_db};
use rowkit::prelude::*;

#[test]
fn maps_keep_column_order() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 2);

    let maps = db
        .table("question")
        .fields(["id", "title"])
        .r#where("`section_id` = ?", [1])
        .maps()
        .unwrap();

    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0].keys().collect::<Vec<_>>(), ["id", "title"]);
    assert_eq!(maps[1].string("title"), "intro q1");
}

#[test]
fn chaining_never_mutates_the_parent() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 3);

    let base = db.table("question");
    let first = base.r#where("`id` = ?", [1]);
    let rest = base.r#where("`id` > ?", [1]);

    assert_eq!(base.count().unwrap(), 3);
    assert_eq!(first.count().unwrap(), 1);
    assert_eq!(rest.count().unwrap(), 2);
    assert!(base.predicate().conditions().is_empty());
}

#[test]
fn scalar_reads() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 2);

    let question = db.table("question").r#where("`id` = ?", [2]);
    assert_eq!(question.int(Some("section_id")).unwrap(), 1);
    assert_eq!(question.string(Some("title")).unwrap(), "intro q1");

    let missing = db.table("question").r#where("`id` = ?", [9]);
    assert_eq!(missing.int(None).unwrap(), 0);
    assert_eq!(missing.string(None).unwrap(), "");
    assert!(missing.first_map().unwrap().is_none());
}

#[test]
fn grid_indexes_columns() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 1);

    let (index, cells) = db
        .table("question_option")
        .fields(["label", "question_id"])
        .grid()
        .unwrap();

    assert_eq!(index["label"], 0);
    assert_eq!(index["question_id"], 1);
    assert_eq!(cells, [["yes", "1"], ["no", "1"]]);
}

#[test]
fn joins_and_conditions() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 1);
    seed_section(&db, "basics", 2);

    let labels = db
        .table("question_option")
        .fields(["`question_option`.`label`", "`question`.`title`"])
        .join("JOIN `question` ON `question`.`id` = `question_option`.`question_id`")
        .r#where("`question`.`section_id` = ?", [2])
        .condition("`question_option`.`label` = 'yes'")
        .maps()
        .unwrap();

    let titles: Vec<String> = labels.iter().map(|m| m.string("title")).collect();
    assert_eq!(titles, ["basics q0", "basics q1"]);
}

#[test]
fn unknown_names_are_rejected_before_running() {
    let (_dir, db) = setup_db();

    let err = db.table("nowhere").maps().unwrap_err();
    assert!(matches!(err, RowkitError::Argument(_)));

    let err = db.table("question").fields(["nope"]).maps().unwrap_err();
    assert!(matches!(err, RowkitError::Argument(_)));

    let err = db.r#where("`id` = ?", [1]).maps().unwrap_err();
    assert!(matches!(err, RowkitError::Argument(_)));
}

#[test]
fn load_uses_the_record_table() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 3);

    let mut questions: Vec<Question> = Vec::new();
    let loaded = db
        .r#where("`id` <> ?", [2])
        .load(&mut questions)
        .unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(questions.iter().map(|q| q.id).collect::<Vec<_>>(), [1, 3]);
    assert!(questions.iter().all(|q| q.found == 1));
}

#[test]
fn concurrent_reads_stay_within_the_pool() {
    let (dir, db) = setup_db();
    seed_section(&db, "intro", 4);
    drop(db);

    let db = rowkit::driver::rusqlite::open(
        dir.path().join("test.db"),
        DbConfig::default().with_pool(PoolConfig::default().with_max_open(2)),
    )
    .unwrap();
    let peak = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..5 {
                    assert_eq!(db.table("question").count().unwrap(), 4);
                    peak.fetch_max(db.pool().status().open, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(db.pool().status().open <= 2);
}
