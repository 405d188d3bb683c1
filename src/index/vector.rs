use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::types::RecordLink;
use crate::index::ore::OreCiphertext;

/// What one term carries to the data service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermPayload {
    /// One ORE ciphertext, or a sequence of them for ordered strings
    #[serde(rename = "term")]
    Ciphertexts(Vec<OreCiphertext>),
    /// Bloom filter positions, ascending
    #[serde(rename = "bits")]
    Bits(Vec<u16>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTerm {
    #[serde(flatten)]
    pub payload: TermPayload,
    #[serde(with = "hex::serde")]
    pub link: RecordLink,
}

impl IndexTerm {
    pub fn ciphertexts(ciphertexts: Vec<OreCiphertext>, link: RecordLink) -> Self {
        IndexTerm {
            payload: TermPayload::Ciphertexts(ciphertexts),
            link,
        }
    }

    pub fn bits(bits: Vec<u16>, link: RecordLink) -> Self {
        IndexTerm {
            payload: TermPayload::Bits(bits),
            link,
        }
    }
}

/// Write-path output of one index for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexVector {
    pub index_id: Uuid,
    pub terms: Vec<IndexTerm>,
}

impl IndexVector {
    pub fn new(index_id: Uuid, terms: Vec<IndexTerm>) -> Self {
        IndexVector { index_id, terms }
    }
}

/// Encrypted condition evaluated by the data service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    /// Some stored term equals `term`
    Exact { term: Vec<OreCiphertext> },
    /// Some stored term equals any one of `terms`. One `match` call on an
    /// ORE match index; alternatives inside it, AND with everything else.
    #[serde(rename = "anyOf")]
    AnyOf { terms: Vec<OreCiphertext> },
    /// Some stored term lies in the inclusive interval
    Range {
        lower: Vec<OreCiphertext>,
        upper: Vec<OreCiphertext>,
    },
    /// The stored filter is a superset of `bits`
    Filter { bits: Vec<u16> },
}

/// Read-path output: one predicate against one index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub index_id: Uuid,
    #[serde(flatten)]
    pub predicate: Predicate,
}

impl Constraint {
    pub fn new(index_id: Uuid, predicate: Predicate) -> Self {
        Constraint { index_id, predicate }
    }

    pub fn exact(index_id: Uuid, term: OreCiphertext) -> Self {
        Constraint::new(index_id, Predicate::Exact { term: vec![term] })
    }

    pub fn any_of(index_id: Uuid, terms: Vec<OreCiphertext>) -> Self {
        Constraint::new(index_id, Predicate::AnyOf { terms })
    }

    pub fn range(index_id: Uuid, lower: Vec<OreCiphertext>, upper: Vec<OreCiphertext>) -> Self {
        Constraint::new(index_id, Predicate::Range { lower, upper })
    }

    pub fn filter(index_id: Uuid, bits: Vec<u16>) -> Self {
        Constraint::new(index_id, Predicate::Filter { bits })
    }
}
