/// End-to-end demo of the indexing engine
///
/// - Compiles a schema into index settings (fresh keys per index)
/// - Analyzes records into encrypted index vectors
/// - Builds queries through the builder and the query language
/// - Plays the data service: evaluates constraints against stored vectors
/// - Re-checks bloom-filter results on the decrypted records
///
/// Run with `RUST_LOG=oredex=debug` to see the engine's own logging.

use std::cmp::Ordering;
use oredex::index::ore::compare_sequences;
use oredex::index::vector::{Constraint, IndexVector, Predicate, TermPayload};
use oredex::schema::schema::CollectionSchema;
use oredex::{Collection, Config, RecordWrite};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║      oredex - Encrypted Indexing Demo         ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    // Step 1: Compile the schema
    let schema = CollectionSchema::from_value(&json!({
        "type": {"title": "string", "year": "int64", "rating": "float64"},
        "indexes": {
            "title": {"kind": "match", "fields": ["title"], "tokenFilters": [{"kind": "downcase"}]},
            "sortTitle": {"kind": "range", "field": "title"},
            "year": {"kind": "range", "field": "year"},
            "rating": {"kind": "range", "field": "rating"}
        }
    }))?;

    let mut rng = StdRng::from_entropy();
    let (collection, settings) =
        Collection::create("movies", &schema, Config::default(), &mut rng)?;
    println!("Step 1: compiled {} indexes", settings.len());
    for index in collection.indexes() {
        println!(
            "  {:<10} kind={:<14} orderable={}",
            index.name(),
            index.kind_name(),
            index.orderable()
        );
    }

    // Step 2: Insert records
    let records = vec![
        json!({"title": "Star Trek: The Motion Picture", "year": 1979, "rating": 6.4}),
        json!({"title": "Star Trek II: The Wrath of Khan", "year": 1982, "rating": 7.7}),
        json!({"title": "Star Trek: First Contact", "year": 1996, "rating": 7.6}),
        json!({"title": "Galaxy Quest", "year": 1999, "rating": 7.4}),
    ];

    let mut store = Vec::new();
    for record in records {
        let write = collection.insert(record)?;
        store.push(write);
    }
    let terms: usize = store.iter().flat_map(|w| &w.vectors).map(|v| v.terms.len()).sum();
    println!("\nStep 2: inserted {} records ({} encrypted terms)\n", store.len(), terms);

    // Step 3: Query through the builder
    let mut builder = collection.query();
    builder.on("title")?.matches("star trek")?;
    builder.on("year")?.between(1980, 2000)?;
    builder.order_by("year", "asc")?;
    let query = builder.build();
    let label = "title ~ 'star trek' AND 1980 <= year <= 2000";
    report(label, &query.request.constraints, &store, |hits| query.filter_results(hits));

    // Step 4: Query through the query language
    let query = collection.query_str("rating.gt(7.5); sortTitle.lt(\"t\")")?;
    report("rating > 7.5 AND title < 't'", &query.request.constraints, &store, |hits| {
        query.filter_results(hits)
    });

    // Step 5: Errors surface with a kind
    match collection.query_str("title.lt(\"x\")") {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!("Rejected: {}", e),
    }

    Ok(())
}

/// What the data service does: every constraint must admit a record
fn report<F>(label: &str, constraints: &[Constraint], store: &[RecordWrite], recheck: F)
where
    F: FnOnce(Vec<Value>) -> Vec<Value>,
{
    let candidates: Vec<Value> = store
        .iter()
        .filter(|write| constraints.iter().all(|c| write.vectors.iter().any(|v| admits(c, v))))
        .filter_map(|write| write.record.clone())
        .collect();

    let candidates_len = candidates.len();
    let results = recheck(candidates);
    println!("Query: {}", label);
    println!("  {} candidates, {} after re-check", candidates_len, results.len());
    for record in &results {
        println!("  - {}", record["title"]);
    }
    println!();
}

fn admits(constraint: &Constraint, vector: &IndexVector) -> bool {
    constraint.index_id == vector.index_id
        && vector.terms.iter().any(|term| match (&constraint.predicate, &term.payload) {
            (Predicate::Exact { term: wanted }, TermPayload::Ciphertexts(stored)) => {
                compare_sequences(wanted, stored) == Ordering::Equal
            }
            (Predicate::AnyOf { terms }, TermPayload::Ciphertexts(stored)) => terms
                .iter()
                .any(|t| compare_sequences(std::slice::from_ref(t), stored) == Ordering::Equal),
            (Predicate::Range { lower, upper }, TermPayload::Ciphertexts(stored)) => {
                compare_sequences(lower, stored) != Ordering::Greater
                    && compare_sequences(stored, upper) != Ordering::Greater
            }
            (Predicate::Filter { bits }, TermPayload::Bits(stored)) => {
                bits.iter().all(|b| stored.contains(b))
            }
            _ => false,
        })
}
