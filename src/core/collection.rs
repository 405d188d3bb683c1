use std::collections::HashSet;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::Record;
use crate::index::Index;
use crate::index::vector::IndexVector;
use crate::parallel::indexer::{index_record, ParallelIndexer};
use crate::query::builder::QueryBuilder;
use crate::query::types::PreparedQuery;
use crate::schema::schema::CollectionSchema;
use crate::schema::settings::{IndexSettings, SchemaVersionWindow};

/// Decrypted index entry as returned by the data service at load time
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub settings: Value,
    pub window: SchemaVersionWindow,
}

/// What one insert/upsert hands to the transport layer
#[derive(Debug, Clone, PartialEq)]
pub struct RecordWrite {
    pub id: Uuid,
    pub vectors: Vec<IndexVector>,
    /// The plaintext to be envelope-encrypted and stored, unless the
    /// collection is in index-only mode
    pub record: Option<Record>,
}

/// A collection's loaded indexes plus the write and query entry points
#[derive(Debug)]
pub struct Collection {
    name: String,
    indexes: Vec<Index>,
    config: Config,
    store_record: bool,
}

impl Collection {
    pub fn new(name: impl Into<String>, indexes: Vec<Index>, config: Config) -> Result<Self> {
        config.validate()?;

        let mut seen = HashSet::new();
        for index in &indexes {
            if !seen.insert(index.name().to_string()) {
                let message = format!("Duplicate index name '{}'", index.name());
                return Err(Error::invalid_schema(message));
            }
        }

        Ok(Collection {
            name: name.into(),
            indexes,
            config,
            store_record: true,
        })
    }

    /// Build from the decrypted index entries of an existing collection
    pub fn load(name: impl Into<String>, entries: Vec<IndexEntry>, config: Config) -> Result<Self> {
        let indexes = entries
            .into_iter()
            .map(|entry| {
                let settings = IndexSettings::from_value(&entry.settings)?;
                Index::new(&entry.id, settings, entry.window)
            })
            .collect::<Result<Vec<_>>>()?;

        let collection = Collection::new(name, indexes, config)?;
        info!(
            collection = %collection.name,
            indexes = collection.indexes.len(),
            "loaded collection"
        );
        Ok(collection)
    }

    /// Compile a schema into fresh index settings and load them.
    /// The settings are returned too, for the transport layer to persist.
    pub fn create<R: Rng>(
        name: impl Into<String>,
        schema: &CollectionSchema,
        config: Config,
        rng: &mut R,
    ) -> Result<(Self, Vec<IndexSettings>)> {
        let settings = schema.compile(rng)?;

        let indexes = settings
            .iter()
            .map(|s| Index::new(&s.meta.index_id, s.clone(), SchemaVersionWindow::current()))
            .collect::<Result<Vec<_>>>()?;

        Ok((Collection::new(name, indexes, config)?, settings))
    }

    /// Index-only mode: writes carry vectors but no record payload
    pub fn with_store_record(mut self, store_record: bool) -> Self {
        self.store_record = store_record;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index_named(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|idx| idx.name() == name)
    }

    /// Vectors of one record across every index
    pub fn analyze(&self, id: &Uuid, record: &Record) -> Result<Vec<IndexVector>> {
        Ok(index_record(&self.indexes, id, record)?.vectors)
    }

    /// New record with a fresh random id
    pub fn insert(&self, record: Record) -> Result<RecordWrite> {
        self.upsert(Uuid::new_v4(), record)
    }

    pub fn upsert(&self, id: Uuid, record: Record) -> Result<RecordWrite> {
        let vectors = self.analyze(&id, &record)?;
        debug!(collection = %self.name, vectors = vectors.len(), "prepared record write");

        Ok(RecordWrite {
            id,
            vectors,
            record: self.store_record.then_some(record),
        })
    }

    /// Re-analyze existing records in parallel (migrations)
    pub fn reindex(&self, records: &[(Uuid, Record)]) -> Result<Vec<RecordWrite>> {
        let indexer = ParallelIndexer::new(self.config.reindex_batch_size);
        let indexed = indexer.index_batch(&self.indexes, records)?;

        info!(collection = %self.name, records = indexed.len(), "re-indexed records");

        Ok(indexed
            .into_iter()
            .zip(records)
            .map(|(indexed, (_, record))| RecordWrite {
                id: indexed.id,
                vectors: indexed.vectors,
                record: self.store_record.then(|| record.clone()),
            })
            .collect())
    }

    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.indexes, &self.config)
    }

    /// Build a query from its textual form
    pub fn query_str(&self, query: &str) -> Result<PreparedQuery> {
        let mut builder = self.query();
        builder.parse(query)?;
        Ok(builder.build())
    }
}
