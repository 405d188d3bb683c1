use std::collections::HashSet;
use std::sync::Arc;
use serde_json::Value;
use uuid::Uuid;
use crate::core::error::Result;
use crate::core::types::{Record, RecordLink};
use crate::index::bloom_filter::{BloomFilter, FilterParams};
use crate::index::ore_match::no_terms;
use crate::index::terms::TermExtractor;
use crate::index::vector::{Constraint, IndexTerm, IndexVector};
use crate::query::result_filter::RecordPredicate;
use crate::schema::settings::{IndexSettings, KeyMaterial};

/// Match family on bloom filters: all terms of a record fold into one filter
/// stored as a single term. Covers `filter-match`, `dynamic-filter-match` and
/// `field-dynamic-filter-match`.
#[derive(Debug, Clone)]
pub struct FilterMatchIndex {
    extractor: Arc<TermExtractor>,
    filter_key: KeyMaterial,
    params: FilterParams,
}

impl FilterMatchIndex {
    pub fn new(extractor: TermExtractor, settings: &IndexSettings) -> Result<Self> {
        let filter_key = KeyMaterial::from_meta(
            settings.meta.filter_key.as_ref(),
            "$filterKey",
            settings.name(),
        )?;

        Ok(FilterMatchIndex {
            extractor: Arc::new(extractor),
            filter_key,
            params: FilterParams::from_mapping(&settings.mapping)?,
        })
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    fn filter_of(&self, terms: &[String]) -> Result<BloomFilter> {
        Ok(BloomFilter::new(self.filter_key.as_bytes(), self.params)?.with_terms(terms))
    }

    pub fn analyze(
        &self,
        index_id: Uuid,
        link: RecordLink,
        record: &Record,
    ) -> Result<Option<IndexVector>> {
        let terms = self.extractor.record_terms(record)?;
        if terms.is_empty() {
            return Ok(None);
        }

        let filter = self.filter_of(&terms)?;
        Ok(Some(IndexVector::new(index_id, vec![IndexTerm::bits(filter.to_bits(), link)])))
    }

    /// Ask for records whose stored filter covers the query's bits
    pub fn match_constraint(&self, index_id: Uuid, args: &[Value]) -> Result<Constraint> {
        let terms = self.extractor.query_terms(args)?;
        if terms.is_empty() {
            return Err(no_terms());
        }

        Ok(Constraint::filter(index_id, self.filter_of(&terms)?.to_bits()))
    }

    /// Exact re-check for a decrypted candidate: the query's terms must all be
    /// among the terms the record yields today. Records that fail extraction
    /// are rejected.
    pub fn result_predicate(&self, args: &[Value]) -> Result<RecordPredicate> {
        let wanted = self.extractor.query_terms(args)?;
        let extractor = Arc::clone(&self.extractor);

        Ok(Box::new(move |record: &Value| {
            match extractor.record_terms(record) {
                Ok(found) => {
                    let found: HashSet<&str> = found.iter().map(String::as_str).collect();
                    wanted.iter().all(|t| found.contains(t.as_str()))
                }
                Err(_) => false,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::index::terms::TermScope;
    use crate::index::vector::{Predicate, TermPayload};
    use serde_json::json;

    fn index(filter_size: u32) -> FilterMatchIndex {
        let settings = IndexSettings::from_value(&json!({
            "meta": {
                "$indexId": "c0ffee00-1234-4abc-8def-0123456789ab",
                "$indexName": "body",
                "$filterKey": "a0a1a2a3a4a5a6a7a8a9aaabacadaeaf"
            },
            "mapping": {
                "kind": "filter-match",
                "fields": ["body"],
                "tokenFilters": [{"kind": "downcase"}],
                "filterSize": filter_size,
                "filterTermBits": 3
            }
        })).unwrap();
        let scope = TermScope::Fields(vec!["body".into()]);
        let extractor = TermExtractor::from_mapping(scope, &settings.mapping).unwrap();
        FilterMatchIndex::new(extractor, &settings).unwrap()
    }

    #[test]
    fn record_filter_covers_query_filter() {
        let idx = index(256);
        let vector = idx
            .analyze(Uuid::nil(), [4; 16], &json!({"body": "Space the final frontier"}))
            .unwrap()
            .unwrap();
        assert_eq!(vector.terms.len(), 1);

        let TermPayload::Bits(stored) = &vector.terms[0].payload else { unreachable!() };
        let constraint = idx.match_constraint(Uuid::nil(), &[json!("final FRONTIER")]).unwrap();
        let Predicate::Filter { bits } = &constraint.predicate else { unreachable!() };

        assert!(bits.iter().all(|b| stored.contains(b)));
    }

    #[test]
    fn predicate_checks_real_terms() {
        let idx = index(256);
        let predicate = idx.result_predicate(&[json!("frontier")]).unwrap();

        assert!(predicate(&json!({"body": "The final frontier"})));
        assert!(!predicate(&json!({"body": "The final countdown"})));
        assert!(!predicate(&json!({"other": "frontier"})));
    }

    #[test]
    fn missing_filter_key_is_internal() {
        let settings = IndexSettings::from_value(&json!({
            "meta": {"$indexId": "c0ffee00-1234-4abc-8def-0123456789ab", "$indexName": "body"},
            "mapping": {"kind": "filter-match", "fields": ["body"]}
        })).unwrap();
        let extractor = TermExtractor::from_mapping(TermScope::Dynamic, &settings.mapping).unwrap();
        let err = FilterMatchIndex::new(extractor, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn bad_filter_size_is_a_schema_error() {
        let settings = IndexSettings::from_value(&json!({
            "meta": {
                "$indexId": "c0ffee00-1234-4abc-8def-0123456789ab",
                "$indexName": "body",
                "$filterKey": "a0a1a2a3a4a5a6a7a8a9aaabacadaeaf"
            },
            "mapping": {"kind": "filter-match", "fields": ["body"], "filterSize": 100}
        })).unwrap();
        let extractor = TermExtractor::from_mapping(TermScope::Dynamic, &settings.mapping).unwrap();
        let err = FilterMatchIndex::new(extractor, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
    }
}
