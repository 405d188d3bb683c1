use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use crate::core::error::{Error, ErrorKind, Result};

/// Length in bytes of every raw key (`$prfKey`, `$prpKey`, `$filterKey`)
pub const KEY_LENGTH: usize = 16;

/// Plaintext type of the field an exact/range index covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    #[serde(alias = "uint", alias = "u64")]
    Uint64,
    #[serde(alias = "int", alias = "integer", alias = "i64")]
    Int64,
    #[serde(alias = "float", alias = "double", alias = "number", alias = "f64")]
    Float64,
    #[serde(alias = "bool")]
    Boolean,
}

impl FieldType {
    pub fn is_string(&self) -> bool {
        matches!(self, FieldType::String)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TokenizerSettings {
    Standard,
}

impl Default for TokenizerSettings {
    fn default() -> Self {
        TokenizerSettings::Standard
    }
}

/// One entry of `tokenFilters`. N-gram bounds stay raw JSON until the text
/// processor validates them, so a non-integer bound gets a schema error
/// instead of a generic decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TokenFilterSettings {
    Downcase,
    Ngram {
        #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
        min_length: Option<Value>,
        #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
        max_length: Option<Value>,
        #[serde(rename = "tokenLength", default, skip_serializing_if = "Option::is_none")]
        token_length: Option<Value>,
    },
}

/// The `meta` block: identity and key material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    #[serde(rename = "$indexId")]
    pub index_id: String,
    #[serde(rename = "$indexName")]
    pub index_name: String,
    #[serde(rename = "$prfKey", default, skip_serializing_if = "Option::is_none")]
    pub prf_key: Option<String>,
    #[serde(rename = "$prpKey", default, skip_serializing_if = "Option::is_none")]
    pub prp_key: Option<String>,
    #[serde(rename = "$filterKey", default, skip_serializing_if = "Option::is_none")]
    pub filter_key: Option<String>,
}

/// The `mapping` block: kind plus kind-specific fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexMapping {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(rename = "fieldType", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<TokenizerSettings>,
    #[serde(rename = "tokenFilters", default, skip_serializing_if = "Vec::is_empty")]
    pub token_filters: Vec<TokenFilterSettings>,
    #[serde(rename = "filterSize", default, skip_serializing_if = "Option::is_none")]
    pub filter_size: Option<u32>,
    #[serde(rename = "filterTermBits", default, skip_serializing_if = "Option::is_none")]
    pub filter_term_bits: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
}

impl IndexMapping {
    /// The single target field of exact/range indexes
    pub fn required_field(&self, index_name: &str) -> Result<&str> {
        self.field.as_deref().ok_or_else(|| {
            Error::invalid_schema(format!(
                "Index '{}' of kind \"{}\" requires a \"field\" in its mapping",
                index_name, self.kind
            ))
        })
    }

    /// The declared target fields of field-scoped match indexes
    pub fn required_fields(&self, index_name: &str) -> Result<&[String]> {
        match self.fields.as_deref() {
            Some(fields) if !fields.is_empty() => Ok(fields),
            _ => Err(Error::invalid_schema(format!(
                "Index '{}' of kind \"{}\" requires a non-empty \"fields\" list in its mapping",
                index_name, self.kind
            ))),
        }
    }
}

/// Decrypted configuration of one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    pub meta: IndexMeta,
    pub mapping: IndexMapping,
}

impl IndexSettings {
    pub fn from_value(value: &Value) -> Result<Self> {
        IndexSettings::deserialize(value)
            .map_err(|e| Error::invalid_schema(format!("Malformed index settings: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::invalid_schema(format!("Malformed index settings: {}", e)))
    }

    pub fn name(&self) -> &str {
        &self.meta.index_name
    }

    pub fn kind(&self) -> &str {
        &self.mapping.kind
    }

    /// The UUID embedded in `meta`
    pub fn index_uuid(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.meta.index_id).map_err(|_| {
            Error::internal(format!("Invalid UUID in index settings: {:?}", self.meta.index_id))
        })
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Schema versions in which an index mapping is valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersionWindow {
    pub first: u32,
    pub last: u32,
    pub searchable: bool,
}

impl SchemaVersionWindow {
    pub fn new(first: u32, last: u32, searchable: bool) -> Self {
        SchemaVersionWindow { first, last, searchable }
    }

    /// Window for an index that exists since the first schema version
    pub fn current() -> Self {
        SchemaVersionWindow::new(0, 0, true)
    }

    pub fn covers(&self, version: u32) -> bool {
        self.first <= version && version <= self.last
    }
}

/// A raw 16-byte key decoded from its hex form
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial([u8; KEY_LENGTH]);

impl KeyMaterial {
    pub fn new(bytes: [u8; KEY_LENGTH]) -> Self {
        KeyMaterial(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::new(
                ErrorKind::Internal,
                format!("Key must be exactly {} bytes, got {}", KEY_LENGTH, bytes.len()),
            )
        })?;
        Ok(KeyMaterial(raw))
    }

    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key)?;
        KeyMaterial::from_slice(&bytes)
    }

    /// Decode a named key from `meta`, failing if it is absent
    pub fn from_meta(value: Option<&String>, name: &str, index_name: &str) -> Result<Self> {
        let hex_key = value.ok_or_else(|| {
            Error::internal(format!("Index '{}' settings are missing {}", index_name, name))
        })?;
        KeyMaterial::from_hex(hex_key)
    }

    pub fn generate<R: rand::RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; KEY_LENGTH];
        rng.fill_bytes(&mut bytes);
        KeyMaterial(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

// Never print key bytes
impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial(..)")
    }
}
