use std::collections::HashSet;
use serde_json::Value;
use uuid::Uuid;
use crate::core::error::Result;
use crate::core::types::{collect_string_fields, Record, RecordLink};
use crate::index::ore::{OreCipher, OreCiphertext, OrePoint};
use crate::index::terms::{arity_error, string_arg};
use crate::index::vector::{Constraint, IndexTerm, IndexVector};
use crate::schema::settings::IndexSettings;

/// Exact match on any string leaf, scoped by field: each leaf is stored whole
/// (untokenized) as the term `"path:value"`.
#[derive(Debug, Clone)]
pub struct FieldDynamicExactIndex {
    cipher: OreCipher,
}

impl FieldDynamicExactIndex {
    pub fn from_settings(settings: &IndexSettings) -> Result<Self> {
        Ok(FieldDynamicExactIndex {
            cipher: OreCipher::from_meta(&settings.meta)?,
        })
    }

    fn encrypt(&self, field: &str, value: &str) -> OreCiphertext {
        self.cipher.encrypt(OrePoint::from_term(&format!("{}:{}", field, value)))
    }

    pub fn analyze(
        &self,
        index_id: Uuid,
        link: RecordLink,
        record: &Record,
    ) -> Result<Option<IndexVector>> {
        let fields = collect_string_fields(record);
        if fields.is_empty() {
            return Ok(None);
        }

        let mut seen = HashSet::new();
        let terms = fields
            .iter()
            .filter(|pair| seen.insert(*pair))
            .map(|(path, value)| IndexTerm::ciphertexts(vec![self.encrypt(path, value)], link))
            .collect();

        Ok(Some(IndexVector::new(index_id, terms)))
    }

    /// `eq(field, value)`
    pub fn eq_constraint(&self, index_id: Uuid, args: &[Value]) -> Result<Constraint> {
        let [field, value] = args else {
            return Err(arity_error(2, args.len()));
        };
        let ct = self.encrypt(string_arg(field)?, string_arg(value)?);
        Ok(Constraint::exact(index_id, ct))
    }
}
