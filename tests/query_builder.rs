mod common;

use common::{admits, index, index_with_window, vector_of};
use oredex::index::vector::Predicate;
use oredex::query::builder::QueryBuilder;
use oredex::query::types::SortOrder;
use oredex::schema::settings::SchemaVersionWindow;
use oredex::{Collection, Config, ErrorKind, Index};
use serde_json::{json, Value};

fn downcase() -> Value {
    json!([{"kind": "downcase"}])
}

fn starships() -> Vec<Index> {
    vec![
        index("name", json!({"kind": "exact", "field": "name", "fieldType": "string"})),
        index("launched", json!({"kind": "range", "field": "launched", "fieldType": "uint64"})),
        index(
            "log",
            json!({"kind": "filter-match", "fields": ["log"], "tokenFilters": downcase()}),
        ),
        index("crew", json!({"kind": "ore-match", "fields": ["crew"], "tokenFilters": downcase()})),
        index("attrs", json!({"kind": "field-dynamic-exact"})),
        index_with_window(
            "registry",
            json!({"kind": "range", "field": "registry", "fieldType": "string"}),
            SchemaVersionWindow::new(1, 2, false),
        ),
    ]
}

#[test]
fn defaults_come_from_config() {
    let indexes = starships();
    let query = QueryBuilder::new(&indexes, &Config::default()).build();
    assert_eq!(query.request.limit, 50);
    assert_eq!(query.request.offset, 0);
    assert!(query.request.constraints.is_empty());
    assert!(query.result_filter.is_empty());

    let config = Config { default_limit: 10, default_offset: 5, ..Config::default() };
    let query = QueryBuilder::new(&indexes, &config).build();
    assert_eq!((query.request.limit, query.request.offset), (10, 5));
}

#[test]
fn constraints_accumulate_in_call_order() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());
    builder.constrain("name", "eq", &[json!("Defiant")]).unwrap();
    builder.constrain("launched", "between", &[json!(2360), json!(2380)]).unwrap();
    builder.order_by("launched", "desc").unwrap();
    builder.limit(3).offset(6);
    let query = builder.build();

    let constraints = &query.request.constraints;
    assert_eq!(constraints.len(), 2);
    assert_eq!(constraints[0].index_id, indexes[0].id());
    assert!(matches!(constraints[0].predicate, Predicate::Exact { .. }));
    assert_eq!(constraints[1].index_id, indexes[1].id());
    assert!(matches!(constraints[1].predicate, Predicate::Range { .. }));

    assert_eq!(query.request.ordering.len(), 1);
    assert_eq!(query.request.ordering[0].index_id, indexes[1].id());
    assert_eq!(query.request.ordering[0].direction, SortOrder::Desc);
    assert_eq!((query.request.limit, query.request.offset), (3, 6));
}

#[test]
fn selector_sugar_matches_explicit_calls() {
    let indexes = starships();

    let mut sugar = QueryBuilder::new(&indexes, &Config::default());
    sugar.on("launched").unwrap().gt(2300).unwrap();
    sugar.on("crew").unwrap().matches("Sisko Dax").unwrap();
    sugar.on("attrs").unwrap().field_eq("class", "Defiant").unwrap();

    let mut explicit = QueryBuilder::new(&indexes, &Config::default());
    explicit.constrain("launched", "gt", &[json!(2300)]).unwrap();
    explicit.constrain("crew", "match", &[json!("Sisko Dax")]).unwrap();
    explicit.constrain("attrs", "eq", &[json!("class"), json!("Defiant")]).unwrap();

    assert_eq!(sugar.build().request, explicit.build().request);
}

#[test]
fn ore_match_groups_its_terms_in_one_constraint() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());
    builder.on("crew").unwrap().matches("sisko dax sisko").unwrap();
    let constraints = builder.build().request.constraints;

    assert_eq!(constraints.len(), 1);
    let Predicate::AnyOf { terms } = &constraints[0].predicate else {
        panic!("expected an anyOf constraint, got {:?}", constraints[0].predicate);
    };
    assert_eq!(terms.len(), 2);
}

#[test]
fn one_match_differs_from_two_matches() {
    let indexes = starships();

    let mut either = QueryBuilder::new(&indexes, &Config::default());
    either.on("crew").unwrap().matches("sisko dax").unwrap();
    let either = either.build().request;

    let mut both = QueryBuilder::new(&indexes, &Config::default());
    both.on("crew").unwrap().matches("sisko").unwrap();
    both.on("crew").unwrap().matches("dax").unwrap();
    let both = both.build().request;

    assert_eq!(either.constraints.len(), 1);
    assert_eq!(both.constraints.len(), 2);
    assert_ne!(either, both);
}

#[test]
fn undefined_index_is_a_constraint_error() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());

    let err = builder.constrain("warp", "eq", &[json!(9)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryConstraint);
    assert_eq!(err.context, "Undefined index 'warp'");

    let err = builder.on("warp").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::QueryConstraint);
}

#[test]
fn unsupported_operators_are_constraint_errors() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());

    for (name, op) in [("name", "lt"), ("log", "eq"), ("launched", "match"), ("name", "like")] {
        let err = builder.constrain(name, op, &[json!("x")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryConstraint, "{}.{}", name, op);
    }
}

#[test]
fn unsearchable_index_rejects_queries_and_ordering() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());

    let err = builder.constrain("registry", "eq", &[json!("NCC-74205")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryConstraint);

    let err = builder.order_by("registry", "asc").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryOrdering);
}

#[test]
fn ordering_errors() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());

    let err = builder.order_by("launched", "sideways").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryOrdering);

    let err = builder.order_by("name", "asc").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryOrdering);
    assert!(err.context.contains("cannot be used for ordering"));

    let err = builder.order_by("warp", "asc").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryOrdering);

    builder.order_by("launched", "ASC").unwrap();
    assert_eq!(builder.build().request.ordering[0].direction, SortOrder::Asc);
}

#[test]
fn bad_arguments_keep_their_kind() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());

    let err = builder.constrain("launched", "gt", &[json!("soon")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = builder.constrain("launched", "between", &[json!(1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryConstraint);

    let err = builder.constrain("log", "match", &[json!("  ")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn only_filter_match_registers_result_checks() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());
    builder.on("crew").unwrap().matches("kira").unwrap();
    builder.on("log").unwrap().matches("wormhole").unwrap();
    builder.on("log").unwrap().matches("prophets").unwrap();

    let query = builder.build();
    assert_eq!(query.result_filter.len(), 2);

    let kept = query.filter_results(vec![
        json!({"log": "The prophets live in the wormhole"}),
        json!({"log": "The wormhole is stable"}),
        json!({"crew": "Kira"}),
    ]);
    assert_eq!(kept, vec![json!({"log": "The prophets live in the wormhole"})]);
}

#[test]
fn result_filter_catches_bloom_false_positives() {
    let log = index(
        "log",
        json!({"kind": "filter-match", "fields": ["log"], "filterSize": 32, "filterTermBits": 3}),
    );

    // Enough distinct words to saturate all 32 bits
    let noisy: Vec<String> = (0..200).map(|i| format!("entry{}", i)).collect();
    let record = json!({"log": noisy.join(" ")});
    let vector = vector_of(&log, &record);

    let indexes = vec![log];
    let mut builder = QueryBuilder::new(&indexes, &Config::default());
    builder.on("log").unwrap().matches("tribbles").unwrap();
    let query = builder.build();

    assert!(admits(&query.request.constraints[0], &vector));
    assert!(query.filter_results(vec![record]).is_empty());
}

#[test]
fn textual_queries_go_through_the_same_checks() {
    let collection = Collection::new("starships", starships(), Config::default()).unwrap();

    let query = collection
        .query_str("name.eq('Defiant'); launched.lte(2371); order_by(launched, asc); offset(10)")
        .unwrap();
    assert_eq!(query.request.constraints.len(), 2);
    assert_eq!(query.request.limit, 50);
    assert_eq!(query.request.offset, 10);

    let field_eq = collection.query_str(r#"attrs.eq("class", "Defiant")"#).unwrap();
    assert_eq!(field_eq.request.constraints.len(), 1);

    let err = collection.query_str("warp.eq(9)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryConstraint);

    let err = collection.query_str("order_by(name, asc)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryOrdering);

    let err = collection.query_str("name.eq('Defiant'").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn requests_serialize_for_the_wire() {
    let indexes = starships();
    let mut builder = QueryBuilder::new(&indexes, &Config::default());
    builder.on("log").unwrap().matches("wormhole").unwrap();
    builder.order_by("launched", "desc").unwrap();

    let wire = serde_json::to_value(&builder.build().request).unwrap();
    assert_eq!(wire["constraints"][0]["indexId"], json!(indexes[2].id().to_string()));
    assert!(wire["constraints"][0]["bits"].is_array());
    assert_eq!(wire["ordering"][0]["direction"], json!("DESC"));
    assert_eq!(wire["limit"], json!(50));
}
