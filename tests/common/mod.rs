#![allow(dead_code)]

use std::cmp::Ordering;
use serde_json::{json, Value};
use uuid::Uuid;
use oredex::index::ore::compare_sequences;
use oredex::index::vector::{Constraint, IndexVector, Predicate, TermPayload};
use oredex::schema::settings::{IndexSettings, SchemaVersionWindow};
use oredex::Index;

pub const PRF_KEY: &str = "000102030405060708090a0b0c0d0e0f";
pub const PRP_KEY: &str = "0f0e0d0c0b0a09080706050403020100";
pub const FILTER_KEY: &str = "a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5";

/// Settings with fixed keys, so two indexes built from the same mapping are
/// interchangeable.
pub fn settings(id: &Uuid, name: &str, mapping: Value) -> IndexSettings {
    IndexSettings::from_value(&json!({
        "meta": {
            "$indexId": id.to_string(),
            "$indexName": name,
            "$prfKey": PRF_KEY,
            "$prpKey": PRP_KEY,
            "$filterKey": FILTER_KEY
        },
        "mapping": mapping
    }))
    .unwrap()
}

pub fn index(name: &str, mapping: Value) -> Index {
    index_with_window(name, mapping, SchemaVersionWindow::current())
}

pub fn index_with_window(name: &str, mapping: Value, window: SchemaVersionWindow) -> Index {
    let id = Uuid::new_v4();
    Index::new(&id.to_string(), settings(&id, name, mapping), window).unwrap()
}

/// What the data service does with one constraint and one stored vector
pub fn admits(constraint: &Constraint, vector: &IndexVector) -> bool {
    if constraint.index_id != vector.index_id {
        return false;
    }

    vector.terms.iter().any(|term| match (&constraint.predicate, &term.payload) {
        (Predicate::Exact { term: wanted }, TermPayload::Ciphertexts(stored)) => {
            compare_sequences(wanted, stored) == Ordering::Equal
        }
        (Predicate::AnyOf { terms }, TermPayload::Ciphertexts(stored)) => terms.iter().any(|t| {
            compare_sequences(std::slice::from_ref(t), stored) == Ordering::Equal
        }),
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

/// A query's constraints are AND-combined
pub fn admits_all(constraints: &[Constraint], vector: &IndexVector) -> bool {
    constraints.iter().all(|c| admits(c, vector))
}

pub fn vector_of(index: &Index, record: &Value) -> IndexVector {
    index
        .analyze(&Uuid::new_v4(), record)
        .unwrap()
        .expect("record should be covered by the index")
}
