pub mod core;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod query;
pub mod parallel;
pub mod conformance;

pub use crate::core::collection::{Collection, IndexEntry, RecordWrite};
pub use crate::core::config::Config;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::index::Index;
pub use crate::query::types::PreparedQuery;

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                            OREDEX ARCHITECTURE                               │
└──────────────────────────────────────────────────────────────────────────────┘

  decrypted settings ──► IndexRegistry ──► Index { id, settings, window, variant }
                         (kind string → descriptor: operators, key policy)

  ┌──────────────────────────── WRITE PATH ────────────────────────────────────┐
  │  Collection::insert(record)                                                │
  │    └─ for each Index: analyze(id, record) ─► Option<IndexVector>           │
  │         Exact / FieldDynamicExact ─► OreCipher::encrypt(OrePoint)          │
  │         Range (numbers)           ─► OreCipher::encrypt(OrePoint)          │
  │         Range (strings)           ─► OrderEncoder ─► ≤6 × OreCipher        │
  │         OreMatch                  ─► TermExtractor ─► 1 ciphertext / term  │
  │         FilterMatch               ─► TermExtractor ─► BloomFilter bits     │
  └────────────────────────────────────────────────────────────────────────────┘

  ┌──────────────────────────── READ PATH ─────────────────────────────────────┐
  │  QueryBuilder (explicit API, IndexSelector sugar, nom DSL)                 │
  │    constrain(index, op, args) ─► Index::generate_constraints ─► Constraint │
  │                               └► FilterMatch: ResultFilter predicate       │
  │    order_by(index, dir)       ─► OrderingDirective (orderable only)        │
  │    build() ─► PreparedQuery { QueryRequest, ResultFilter }                 │
  └────────────────────────────────────────────────────────────────────────────┘

  Transport, envelope encryption and credentials live outside this crate.
*/
