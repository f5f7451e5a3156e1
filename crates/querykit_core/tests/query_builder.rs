use querykit_core::{
    blog_schema, EntityType, Filter, FindOne, Included, PendingOperation, QueryBuilder,
    QueryError, Record, RecordHandle, RecordStore, StoreError, StoreResult, UserQuery, COMMENT,
    POST, STORY, USER,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    target: EntityType,
    id: String,
    filter: Value,
    includes: Vec<EntityType>,
}

/// In-memory store that records every request it receives.
#[derive(Default)]
struct RecordingStore {
    calls: RefCell<Vec<Recorded>>,
    rows: HashMap<String, Record>,
    related: HashMap<(String, EntityType), Vec<Record>>,
}

impl RecordingStore {
    fn with_row(mut self, value: Value) -> Self {
        let row = record(value);
        let id = row["id"].as_str().unwrap().to_string();
        self.rows.insert(id, row);
        self
    }

    fn with_related(mut self, id: &str, entity: EntityType, values: Vec<Value>) -> Self {
        self.related.insert(
            (id.to_string(), entity),
            values.into_iter().map(record).collect(),
        );
        self
    }

    fn calls(&self) -> Vec<Recorded> {
        self.calls.borrow().clone()
    }
}

impl RecordStore for RecordingStore {
    fn find_one(&self, request: &FindOne<'_>) -> StoreResult<Option<RecordHandle>> {
        self.calls.borrow_mut().push(Recorded {
            target: request.target,
            id: request.id.to_string(),
            filter: Value::Object(request.filter.clone()),
            includes: request.includes.to_vec(),
        });

        let mut aliases = Vec::new();
        for include in request.includes {
            let relation = blog_schema()
                .relation(request.target, *include)
                .ok_or(StoreError::RelationNotFound {
                    target: request.target,
                    relation: *include,
                })?;
            aliases.push((relation.alias, *include));
        }

        let Some(fields) = self.rows.get(request.id) else {
            return Ok(None);
        };
        let mut handle = RecordHandle::new(request.target, fields.clone());
        for (alias, include) in aliases {
            let loaded = self
                .related
                .get(&(request.id.to_string(), include))
                .cloned()
                .unwrap_or_default();
            handle = handle.with_included(alias, Included::Many(loaded));
        }
        Ok(Some(handle))
    }
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn filter(value: Value) -> Filter {
    value.as_object().cloned().unwrap()
}

#[test]
fn includes_keep_call_order_and_duplicates() {
    let store = RecordingStore::default();
    let builder = QueryBuilder::new(&store, USER)
        .with(POST)
        .with(COMMENT)
        .with(POST);

    assert_eq!(builder.target(), USER);
    assert_eq!(builder.includes(), vec![POST, COMMENT, POST]);
}

#[test]
fn run_without_bound_operation_fails_without_io() {
    let store = RecordingStore::default().with_row(json!({"id": "u1"}));
    let builder = QueryBuilder::new(&store, USER).with(POST);

    let err = builder.run().unwrap_err();
    assert!(matches!(err, QueryError::UnboundOperation { target } if target == USER));
    assert_eq!(err.code(), "unbound_operation");
    assert!(builder.plan().is_err());
    assert!(store.calls().is_empty());
}

#[test]
fn read_with_posts_and_comments_issues_one_query() {
    let store = RecordingStore::default()
        .with_row(json!({"id": "u1", "name": "A"}))
        .with_related("u1", POST, vec![json!({"id": "p1"})]);

    let result = QueryBuilder::new(&store, USER)
        .with(POST)
        .with(COMMENT)
        .read("u1")
        .run()
        .unwrap()
        .unwrap();

    assert_eq!(
        store.calls(),
        vec![Recorded {
            target: USER,
            id: "u1".to_string(),
            filter: json!({}),
            includes: vec![POST, COMMENT],
        }]
    );
    assert_eq!(
        Value::Object(result),
        json!({"id": "u1", "name": "A", "posts": [{"id": "p1"}], "comments": []})
    );
}

#[test]
fn filters_are_merged_before_the_query() {
    let store = RecordingStore::default();

    QueryBuilder::new(&store, USER)
        .filter(filter(json!({"name": "A"})))
        .filter(filter(json!({"age": 30})))
        .read("u1")
        .run()
        .unwrap();

    assert_eq!(store.calls()[0].filter, json!({"name": "A", "age": 30}));
}

#[test]
fn nested_filters_merge_recursively_through_the_builder() {
    let store = RecordingStore::default();
    let plan = QueryBuilder::new(&store, USER)
        .filter(filter(json!({"age": {"gte": 18}, "name": "A"})))
        .filter(filter(json!({"age": {"lt": 65}})))
        .filter(filter(json!({"name": {"like": "B%"}})))
        .read("u1")
        .plan()
        .unwrap();

    assert_eq!(
        Value::Object(plan.filter),
        json!({"age": {"gte": 18, "lt": 65}, "name": {"like": "B%"}})
    );
}

#[test]
fn missing_record_is_none_not_error() {
    let store = RecordingStore::default();
    let result = QueryBuilder::new(&store, USER).read("missing").run().unwrap();
    assert!(result.is_none());
    assert_eq!(store.calls().len(), 1);
}

#[test]
fn read_again_replaces_bound_operation() {
    let store = RecordingStore::default();
    let builder = QueryBuilder::new(&store, USER).read("u1").read("u2");

    assert_eq!(
        builder.operation(),
        Some(&PendingOperation::ReadById {
            id: "u2".to_string()
        })
    );
    builder.run().unwrap();
    assert_eq!(store.calls()[0].id, "u2");
}

#[test]
fn branches_from_a_common_base_stay_independent() {
    let store = RecordingStore::default();
    let base = QueryBuilder::new(&store, USER)
        .with(POST)
        .filter(filter(json!({"name": "A"})));

    let narrow = base.with(COMMENT).filter(filter(json!({"age": 30}))).read("u1");
    let wide = base.read("u2");

    assert_eq!(base.includes(), vec![POST]);
    assert_eq!(base.filters().len(), 1);
    assert!(base.operation().is_none());

    narrow.run().unwrap();
    wide.run().unwrap();

    let calls = store.calls();
    assert_eq!(calls[0].includes, vec![POST, COMMENT]);
    assert_eq!(calls[0].filter, json!({"name": "A", "age": 30}));
    assert_eq!(calls[1].includes, vec![POST]);
    assert_eq!(calls[1].filter, json!({"name": "A"}));
}

#[test]
fn running_twice_re_executes_and_returns_equal_results() {
    let store = RecordingStore::default()
        .with_row(json!({"id": "u1", "name": "A"}))
        .with_related("u1", POST, vec![json!({"id": "p1"})]);
    let query = QueryBuilder::new(&store, USER).with(POST).read("u1");

    let first = query.run().unwrap();
    let second = query.run().unwrap();

    assert_eq!(first, second);
    assert_eq!(store.calls().len(), 2);
}

#[test]
fn relation_not_found_propagates_unchanged() {
    let store = RecordingStore::default().with_row(json!({"id": "s1"}));
    let err = QueryBuilder::new(&store, STORY)
        .with(COMMENT)
        .read("s1")
        .run()
        .unwrap_err();

    match err {
        QueryError::Store(StoreError::RelationNotFound { target, relation }) => {
            assert_eq!(target, STORY);
            assert_eq!(relation, COMMENT);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn user_query_sugar_matches_generic_includes() {
    let store = RecordingStore::default();
    let sugar = UserQuery::new(&store)
        .with_comments()
        .with_posts()
        .with_stories()
        .read("u1")
        .plan()
        .unwrap();
    let generic = QueryBuilder::new(&store, USER)
        .with(COMMENT)
        .with(POST)
        .with(STORY)
        .read("u1")
        .plan()
        .unwrap();

    assert_eq!(sugar, generic);
}

#[test]
fn plan_serializes_for_inspection() {
    let store = RecordingStore::default();
    let plan = QueryBuilder::new(&store, USER)
        .with(POST)
        .filter(filter(json!({"first_name": "A"})))
        .read("u1")
        .plan()
        .unwrap();

    assert_eq!(
        serde_json::to_value(&plan).unwrap(),
        json!({
            "target": "User",
            "operation": {"op": "read_by_id", "id": "u1"},
            "includes": ["Post"],
            "filter": {"first_name": "A"}
        })
    );
}
