use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;
use crate::core::error::{Error, Result};
use crate::index::Index;
use crate::index::vector::IndexVector;

/// Vectors produced for one record
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub id: Uuid,
    pub vectors: Vec<IndexVector>,
}

/// Parallel record indexer for migrations and bulk loads
pub struct ParallelIndexer {
    pub workers: Option<usize>,
    pub batch_size: usize,
    pub progress: Arc<AtomicUsize>,
}

impl ParallelIndexer {
    pub fn new(batch_size: usize) -> Self {
        ParallelIndexer {
            workers: None,
            batch_size: batch_size.max(1),
            progress: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run on a dedicated pool of `workers` threads instead of rayon's global one
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn get_progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Analyze every record against every index. Output keeps input order;
    /// the first failing record aborts the batch.
    pub fn index_batch(
        &self,
        indexes: &[Index],
        records: &[(Uuid, Value)],
    ) -> Result<Vec<IndexedRecord>> {
        match self.workers {
            Some(workers) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| Error::internal(format!("Failed to start indexing pool: {}", e)))?;
                pool.install(|| self.run(indexes, records))
            }
            None => self.run(indexes, records),
        }
    }

    fn run(&self, indexes: &[Index], records: &[(Uuid, Value)]) -> Result<Vec<IndexedRecord>> {
        self.progress.store(0, Ordering::Relaxed);
        let total = records.len();

        let batches: Vec<Result<Vec<IndexedRecord>>> = records
            .par_chunks(self.batch_size)
            .map(|batch| {
                let indexed = batch
                    .iter()
                    .map(|(id, record)| index_record(indexes, id, record))
                    .collect::<Result<Vec<_>>>()?;

                let done = self.progress.fetch_add(batch.len(), Ordering::Relaxed) + batch.len();
                info!(done, total, percent = done * 100 / total.max(1), "re-index progress");

                Ok(indexed)
            })
            .collect();

        let mut out = Vec::with_capacity(total);
        for batch in batches {
            out.extend(batch?);
        }
        Ok(out)
    }
}

pub fn index_record(indexes: &[Index], id: &Uuid, record: &Value) -> Result<IndexedRecord> {
    let mut vectors = Vec::new();
    for index in indexes {
        if let Some(vector) = index.analyze(id, record)? {
            vectors.push(vector);
        }
    }

    Ok(IndexedRecord { id: *id, vectors })
}
