use serde_json::Value;
use uuid::Uuid;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{nested_lookup, Record, RecordLink};
use crate::index::exact::{query_point, required_field_type};
use crate::index::operator::Operator;
use crate::index::order_encoder::{OrderEncoder, MAX_ORDERED_TERMS};
use crate::index::ore::{OreCipher, OreCiphertext, OrePoint};
use crate::index::terms::arity_error;
use crate::index::vector::{Constraint, IndexTerm, IndexVector};
use crate::schema::settings::{FieldType, IndexSettings};

/// Ordered index over a single scalar field.
///
/// Numbers, booleans and floats are one ciphertext. Strings go through the
/// `OrderEncoder` and store one ciphertext per encoded word.
#[derive(Debug, Clone)]
pub struct RangeIndex {
    pub field: String,
    pub field_type: FieldType,
    cipher: OreCipher,
    encoder: OrderEncoder,
}

impl RangeIndex {
    pub fn from_settings(settings: &IndexSettings) -> Result<Self> {
        Ok(RangeIndex {
            field: settings.mapping.required_field(settings.name())?.to_string(),
            field_type: required_field_type(settings)?,
            cipher: OreCipher::from_meta(&settings.meta)?,
            encoder: OrderEncoder::new(),
        })
    }

    pub fn field_value<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        nested_lookup(record, &self.field)
    }

    pub fn analyze(&self, index_id: Uuid, link: RecordLink, value: &Value) -> Result<IndexVector> {
        let ciphertexts = if self.field_type.is_string() {
            let s = value.as_str().ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidRecord,
                    format!("Field '{}' must be a string", self.field),
                )
            })?;
            self.encrypt_words(&self.words(s)?)
        } else {
            vec![self.cipher.encrypt(OrePoint::from_value(value, self.field_type)?)]
        };

        Ok(IndexVector::new(index_id, vec![IndexTerm::ciphertexts(ciphertexts, link)]))
    }

    pub fn constraint(&self, index_id: Uuid, op: Operator, args: &[Value]) -> Result<Constraint> {
        if args.len() != op.arity() {
            return Err(arity_error(op.arity(), args.len()));
        }

        if self.field_type.is_string() {
            return self.string_constraint(index_id, op, args);
        }

        let first = query_point(&args[0], self.field_type)?;
        let (lower, upper) = match op {
            Operator::Eq => (Some(first), Some(first)),
            Operator::Lt => (None, Some(first.pred().ok_or_else(|| empty_range(op))?)),
            Operator::Lte => (None, Some(first)),
            Operator::Gt => (Some(first.succ().ok_or_else(|| empty_range(op))?), None),
            Operator::Gte => (Some(first), None),
            Operator::Between => (Some(first), Some(query_point(&args[1], self.field_type)?)),
            Operator::Match => return Err(unsupported(op)),
        };

        let (lower, upper) = self.cipher.encrypt_range(lower, upper)?;
        Ok(Constraint::range(index_id, vec![lower], vec![upper]))
    }

    // `eq` pins the whole encoded sequence; the other operators only bound the
    // first word, so matches are decided by the leading dozen characters.
    fn string_constraint(
        &self,
        index_id: Uuid,
        op: Operator,
        args: &[Value],
    ) -> Result<Constraint> {
        let words = self.words(string_query(&args[0])?)?;

        if op == Operator::Eq {
            let ciphertexts = self.encrypt_words(&words);
            return Ok(Constraint::range(index_id, ciphertexts.clone(), ciphertexts));
        }

        let first = OrePoint(words[0]);
        let (lower, upper) = match op {
            Operator::Lt => (None, Some(first.pred().ok_or_else(|| empty_range(op))?)),
            Operator::Lte => (None, Some(first)),
            Operator::Gt => (Some(first.succ().ok_or_else(|| empty_range(op))?), None),
            Operator::Gte => (Some(first), None),
            Operator::Between => {
                let max = self.words(string_query(&args[1])?)?;
                (Some(first), Some(OrePoint(max[0])))
            }
            _ => return Err(unsupported(op)),
        };

        let (lower, upper) = self.cipher.encrypt_range(lower, upper)?;

        // Stored strings can run to MAX_ORDERED_TERMS words. Padding the upper
        // bound with maximal words keeps every value that shares its first
        // word inside the range; the single-word lower bound already sorts
        // before them as a prefix.
        let mut uppers = Vec::with_capacity(MAX_ORDERED_TERMS);
        uppers.push(upper);
        uppers.resize_with(MAX_ORDERED_TERMS, || self.cipher.encrypt(OrePoint::MAX));
        Ok(Constraint::range(index_id, vec![lower], uppers))
    }

    /// Encoded words of `s`; the empty string is a single zero word
    fn words(&self, s: &str) -> Result<Vec<u64>> {
        let mut words = self.encoder.encode(s)?;
        if words.is_empty() {
            words.push(0);
        }
        Ok(words)
    }

    fn encrypt_words(&self, words: &[u64]) -> Vec<OreCiphertext> {
        words.iter().map(|w| self.cipher.encrypt(OrePoint(*w))).collect()
    }
}

fn string_query(value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidInput,
            "Range queries over a string field take string arguments",
        )
    })
}

fn empty_range(op: Operator) -> Error {
    Error::new(ErrorKind::InvalidInput, format!("'{}' bound leaves an empty range", op))
}

fn unsupported(op: Operator) -> Error {
    Error::new(
        ErrorKind::UnsupportedOperator,
        format!("Operator '{}' is not supported by range indexes", op),
    )
}
