use serde_json::Value;
use uuid::Uuid;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{nested_lookup, Record, RecordLink};
use crate::index::ore::{OreCipher, OrePoint};
use crate::index::vector::{Constraint, IndexTerm, IndexVector};
use crate::schema::settings::{FieldType, IndexSettings};

/// Equality over a single scalar field: one ORE ciphertext per record
#[derive(Debug, Clone)]
pub struct ExactIndex {
    pub field: String,
    pub field_type: FieldType,
    cipher: OreCipher,
}

impl ExactIndex {
    pub fn from_settings(settings: &IndexSettings) -> Result<Self> {
        Ok(ExactIndex {
            field: settings.mapping.required_field(settings.name())?.to_string(),
            field_type: required_field_type(settings)?,
            cipher: OreCipher::from_meta(&settings.meta)?,
        })
    }

    /// The mapped field's value, or `None` when the record has none
    pub fn field_value<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        nested_lookup(record, &self.field)
    }

    pub fn analyze(&self, index_id: Uuid, link: RecordLink, value: &Value) -> Result<IndexVector> {
        let point = OrePoint::from_value(value, self.field_type)?;
        let term = IndexTerm::ciphertexts(vec![self.cipher.encrypt(point)], link);
        Ok(IndexVector::new(index_id, vec![term]))
    }

    pub fn eq_constraint(&self, index_id: Uuid, value: &Value) -> Result<Constraint> {
        let point = query_point(value, self.field_type)?;
        Ok(Constraint::exact(index_id, self.cipher.encrypt(point)))
    }
}

pub(crate) fn required_field_type(settings: &IndexSettings) -> Result<FieldType> {
    settings.mapping.field_type.ok_or_else(|| {
        Error::invalid_schema(format!(
            "Index '{}' of kind \"{}\" requires a \"fieldType\" in its mapping",
            settings.name(),
            settings.kind()
        ))
    })
}

/// Query arguments are caller input, so a type mismatch is `InvalidInput`
pub(crate) fn query_point(value: &Value, field_type: FieldType) -> Result<OrePoint> {
    OrePoint::from_value(value, field_type)
        .map_err(|e| Error::new(ErrorKind::InvalidInput, e.context))
}
