#![cfg(feature = "rusqlite")]

mod common;

use common::{Question, Section, Team, seed_section, setup_db};
use rowkit::prelude::*;
use rowkit::{Relation, relation};

fn link_team(db: &Db, team: &str, section_ids: &[i64]) -> u64 {
    let team_id = db
        .insert_map("team", RowMap::new().with("name", team))
        .unwrap();
    for section_id in section_ids {
        db.insert_map(
            "team_section",
            RowMap::new()
                .with("team_id", team_id)
                .with("section_id", *section_id),
        )
        .unwrap();
    }
    team_id
}

#[test]
fn has_many_fills_collections() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 2);

    let mut question = Question::default();
    assert_eq!(db.load_all(&mut question, Filter::id(1)).unwrap(), 1);

    let labels: Vec<&str> = question.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["yes", "no"]);
    assert!(question.options.iter().all(|o| o.question_id == 1));
}

#[test]
fn belongs_to_fills_the_parent() {
    let (_dir, db) = setup_db();
    let section_id = seed_section(&db, "intro", 1);

    let mut question = Question::default();
    db.load_all(&mut question, Filter::id(1)).unwrap();

    let section = question.section.expect("section is loaded");
    assert_eq!(section.id, section_id);
    assert_eq!(section.name, "intro");
    assert!(
        section.questions.is_empty(),
        "the question table is already on the load path"
    );
}

#[test]
fn many_to_many_goes_through_the_join_table() {
    let (_dir, db) = setup_db();
    let intro = seed_section(&db, "intro", 1);
    seed_section(&db, "basics", 1);
    let advanced = seed_section(&db, "advanced", 1);
    let team_id = link_team(&db, "core", &[intro, advanced]);

    let mut team = Team::default();
    db.load_all(&mut team, Filter::id(team_id)).unwrap();

    let names: Vec<&str> = team.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["intro", "advanced"]);

    // Sections go on to load their questions and options.
    let first = &team.sections[0];
    assert_eq!(first.questions.len(), 1);
    assert_eq!(first.questions[0].options.len(), 2);
    assert!(first.questions[0].section.is_none());
}

#[test]
fn unrelated_nested_fields_stay_empty() {
    let (_dir, db) = setup_db();
    let intro = seed_section(&db, "intro", 1);
    let team_id = link_team(&db, "core", &[intro]);
    db.insert_map("member", RowMap::new().with("name", "ana"))
        .unwrap();

    let mut team = Team::default();
    assert_eq!(db.load_all(&mut team, Filter::id(team_id)).unwrap(), 1);

    assert!(team.members.is_empty());
    assert_eq!(team.sections.len(), 1, "related fields still load");
    assert!(db.resolve("member", &team).unwrap_err().is_not_found_relation());
}

#[test]
fn cycles_terminate() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 2);

    let mut sections: Vec<Section> = Vec::new();
    db.load_all(&mut sections, Filter::All).unwrap();

    assert_eq!(sections.len(), 1);
    let questions = &sections[0].questions;
    assert_eq!(questions.len(), 2);
    assert!(questions.iter().all(|q| q.section.is_none()));
    assert!(questions.iter().all(|q| q.options.len() == 2));
}

#[test]
fn max_depth_limits_nesting() {
    let (dir, db) = setup_db();
    seed_section(&db, "intro", 1);
    let team_id = link_team(&db, "core", &[1]);
    drop(db);

    let shallow = rowkit::driver::rusqlite::open(
        dir.path().join("test.db"),
        DbConfig::default().with_max_depth(1),
    )
    .unwrap();

    let mut team = Team::default();
    shallow.load_all(&mut team, Filter::id(team_id)).unwrap();
    assert_eq!(team.sections.len(), 1);
    assert!(team.sections[0].questions.is_empty());
}

#[test]
fn soft_deleted_children_are_skipped() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 3);
    db.delete_by_id("question", 2).unwrap();

    let mut section = Section::default();
    db.load_all(&mut section, Filter::id(1)).unwrap();

    let ids: Vec<i64> = section.questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, [1, 3]);
}

#[test]
fn resolve_follows_rule_order() {
    let (_dir, db) = setup_db();
    seed_section(&db, "intro", 1);

    let mut question = Question::default();
    db.find(&mut question, Filter::id(1)).unwrap();

    let belongs = db.resolve("section", &question).unwrap();
    assert_eq!(
        belongs.relation,
        Relation::BelongsTo {
            foreign_key: "section_id".into()
        }
    );
    assert_eq!(belongs.value, Value::Int(1));

    let has_many = db.resolve("question_option", &question).unwrap();
    assert_eq!(
        has_many.relation,
        Relation::HasMany {
            foreign_key: "question_id".into()
        }
    );

    let team = Team {
        id: 7,
        ..Default::default()
    };
    let m2m = db.resolve("section", &team).unwrap();
    assert!(matches!(m2m.relation, Relation::ManyToMany { ref join_table, .. } if join_table == "team_section"));
    let (sql, args) = m2m.into_predicate().render().unwrap();
    assert_eq!(
        sql,
        "SELECT `section`.* FROM `section` \
         LEFT JOIN `team_section` ON `team_section`.`section_id` = `section`.`id` \
         WHERE `team_section`.`team_id` = ?"
    );
    assert_eq!(args, [Value::Int(7)]);

    let err = db.resolve("member", &question).unwrap_err();
    assert!(err.is_not_found_relation());
}

#[test]
fn belongs_to_beats_many_to_many() {
    let (_dir, db) = setup_db();
    // `team` has `section_id` and `team_section` pairs both keys.
    db.exec("ALTER TABLE team ADD COLUMN section_id INTEGER NOT NULL DEFAULT 0", &[])
        .unwrap();

    assert_eq!(
        relation::resolve("section", "team", &db),
        Some(Relation::BelongsTo {
            foreign_key: "section_id".into()
        })
    );
}
