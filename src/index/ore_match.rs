use std::sync::Arc;
use serde_json::Value;
use uuid::Uuid;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{Record, RecordLink};
use crate::index::ore::{OreCipher, OrePoint};
use crate::index::terms::TermExtractor;
use crate::index::vector::{Constraint, IndexTerm, IndexVector};
use crate::schema::settings::IndexSettings;

/// Match family on ORE: every extracted term is stored as its own ciphertext.
/// Covers `ore-match`, `dynamic-ore-match` and `field-dynamic-ore-match`;
/// the difference is only the `TermScope` of the extractor.
#[derive(Debug, Clone)]
pub struct OreMatchIndex {
    extractor: Arc<TermExtractor>,
    cipher: OreCipher,
}

impl OreMatchIndex {
    pub fn new(extractor: TermExtractor, settings: &IndexSettings) -> Result<Self> {
        Ok(OreMatchIndex {
            extractor: Arc::new(extractor),
            cipher: OreCipher::from_meta(&settings.meta)?,
        })
    }

    pub fn extractor(&self) -> &Arc<TermExtractor> {
        &self.extractor
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

        let terms = terms
            .iter()
            .map(|t| {
                let ciphertext = self.cipher.encrypt(OrePoint::from_term(t));
                IndexTerm::ciphertexts(vec![ciphertext], link)
            })
            .collect();

        Ok(Some(IndexVector::new(index_id, terms)))
    }

    /// A single constraint holding one ciphertext per query term. The terms
    /// are alternatives: a record matches if any of its terms equals any of
    /// them.
    pub fn match_constraint(&self, index_id: Uuid, args: &[Value]) -> Result<Constraint> {
        let terms = self.extractor.query_terms(args)?;
        if terms.is_empty() {
            return Err(no_terms());
        }

        let ciphertexts = terms
            .iter()
            .map(|t| self.cipher.encrypt(OrePoint::from_term(t)))
            .collect();
        Ok(Constraint::any_of(index_id, ciphertexts))
    }
}

pub(crate) fn no_terms() -> Error {
    Error::new(ErrorKind::InvalidInput, "The match query produced no searchable terms")
}
