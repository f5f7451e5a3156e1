use querykit_core::db::open_db_in_memory;
use querykit_core::{
    blog_schema, Filter, QueryBuilder, QueryError, SqliteRecordStore, StoreError, UserQuery,
    COMMENT, POST, STORY, USER,
};
use rusqlite::{params, Connection};
use serde_json::{json, Value};

fn filter(value: Value) -> Filter {
    value.as_object().cloned().unwrap()
}

fn blog_fixture() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (id, first_name, last_name) VALUES ('u1', 'A', NULL);
         INSERT INTO users (id, first_name, last_name) VALUES ('u2', 'B', 'Smith');
         INSERT INTO posts (id, title, user_id) VALUES ('p1', 'hello', 'u1');
         INSERT INTO posts (id, title, user_id) VALUES ('p2', 'other', 'u2');
         INSERT INTO comments (id, content, user_id, post_id) VALUES ('c1', 'nice', 'u2', 'p1');",
    )
    .unwrap();
    conn
}

#[test]
fn user_with_posts_and_comments_snapshot() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();

    let record = QueryBuilder::new(&store, USER)
        .with(POST)
        .with(COMMENT)
        .read("u1")
        .run()
        .unwrap()
        .unwrap();

    assert_eq!(
        Value::Object(record),
        json!({
            "id": "u1",
            "first_name": "A",
            "last_name": null,
            "posts": [{"id": "p1", "title": "hello", "user_id": "u1"}],
            "comments": []
        })
    );
}

#[test]
fn belongs_to_includes_nest_a_single_object() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();

    let record = QueryBuilder::new(&store, COMMENT)
        .with(POST)
        .with(USER)
        .read("c1")
        .run()
        .unwrap()
        .unwrap();

    assert_eq!(record["post"], json!({"id": "p1", "title": "hello", "user_id": "u1"}));
    assert_eq!(record["user"]["first_name"], json!("B"));
}

#[test]
fn missing_id_returns_none() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();

    let result = QueryBuilder::new(&store, USER).with(POST).read("nope").run().unwrap();
    assert!(result.is_none());
}

#[test]
fn filters_narrow_the_id_match() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();
    let base = QueryBuilder::new(&store, USER).read("u2");

    let matching = base.filter(filter(json!({"first_name": "B", "last_name": "Smith"})));
    assert!(matching.run().unwrap().is_some());

    let rejected = base.filter(filter(json!({"first_name": "A"})));
    assert!(rejected.run().unwrap().is_none());

    let null_check = base.filter(filter(json!({"last_name": {"ne": null}})));
    assert!(null_check.run().unwrap().is_some());
}

#[test]
fn merged_operator_maps_form_ranges() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();
    let base = QueryBuilder::new(&store, USER)
        .filter(filter(json!({"first_name": {"gte": "A"}})))
        .read("u2");

    let inside = base.filter(filter(json!({"first_name": {"lt": "C"}})));
    assert!(inside.run().unwrap().is_some());

    let outside = base.filter(filter(json!({"first_name": {"lt": "B"}})));
    assert!(outside.run().unwrap().is_none());

    let membership = base.filter(filter(json!({"first_name": {"in": ["A", "B"]}})));
    assert!(membership.run().unwrap().is_some());
}

#[test]
fn undeclared_relation_fails_before_reading() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();

    let err = QueryBuilder::new(&store, STORY)
        .with(COMMENT)
        .read("missing-story")
        .run()
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::Store(StoreError::RelationNotFound { target, relation })
            if target == STORY && relation == COMMENT
    ));
    assert_eq!(err.code(), "relation_not_found");
}

#[test]
fn unknown_filter_field_is_rejected() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();

    let err = QueryBuilder::new(&store, USER)
        .filter(filter(json!({"age": 30})))
        .read("u1")
        .run()
        .unwrap_err();

    assert!(matches!(err, QueryError::Store(StoreError::InvalidFilter(_))));
}

#[test]
fn duplicate_includes_load_the_same_key() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();

    let record = UserQuery::new(&store)
        .with_posts()
        .with_posts()
        .read("u1")
        .run()
        .unwrap()
        .unwrap();

    assert_eq!(record["posts"].as_array().unwrap().len(), 1);
}

#[test]
fn repeated_runs_see_current_data() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();
    let query = UserQuery::new(&store).with_posts().read("u1");

    let first = query.run().unwrap();
    assert_eq!(first, query.run().unwrap());

    conn.execute(
        "INSERT INTO posts (id, title, user_id) VALUES (?1, ?2, ?3);",
        params!["p3", "later", "u1"],
    )
    .unwrap();
    let after = query.run().unwrap().unwrap();
    assert_eq!(after["posts"].as_array().unwrap().len(), 2);
}

#[test]
fn runs_inside_a_caller_transaction() {
    let conn = blog_fixture();
    let store = SqliteRecordStore::try_new(&conn, blog_schema()).unwrap();

    conn.execute_batch("BEGIN;").unwrap();
    conn.execute(
        "INSERT INTO users (id, first_name) VALUES ('u3', 'C');",
        [],
    )
    .unwrap();
    let record = QueryBuilder::new(&store, USER).read("u3").run().unwrap();
    conn.execute_batch("ROLLBACK;").unwrap();

    assert_eq!(record.unwrap()["first_name"], json!("C"));
    assert!(QueryBuilder::new(&store, USER).read("u3").run().unwrap().is_none());
}

#[test]
fn store_requires_migrated_tables() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteRecordStore::try_new(&conn, blog_schema()).err().unwrap();
    assert!(matches!(err, StoreError::MissingRequiredTable(_)));
}
