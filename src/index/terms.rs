use std::collections::HashSet;
use serde_json::Value;
use tracing::debug;
use crate::analysis::text_processor::TextProcessor;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{collect_string_fields, nested_lookup, Record};
use crate::schema::settings::IndexMapping;

/// Where the match-family kinds pull their text from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermScope {
    /// The declared `fields`, each looked up by dotted path
    Fields(Vec<String>),
    /// Every string leaf of the record; field names are not part of the term
    Dynamic,
    /// Every string leaf, each term prefixed with `"path:"`
    FieldDynamic,
}

/// Text extraction shared by the write path, the read path and the result
/// filter, so all three see exactly the same terms.
#[derive(Debug, Clone)]
pub struct TermExtractor {
    scope: TermScope,
    processor: TextProcessor,
}

impl TermExtractor {
    pub fn new(scope: TermScope, processor: TextProcessor) -> Self {
        TermExtractor { scope, processor }
    }

    pub fn from_mapping(scope: TermScope, mapping: &IndexMapping) -> Result<Self> {
        let tokenizer = mapping.tokenizer.clone().unwrap_or_default();
        let processor = TextProcessor::from_settings(&tokenizer, &mapping.token_filters)?;
        Ok(TermExtractor::new(scope, processor))
    }

    pub fn scope(&self) -> &TermScope {
        &self.scope
    }

    /// Unique terms of a record, in first-seen order
    pub fn record_terms(&self, record: &Record) -> Result<Vec<String>> {
        let mut terms = Vec::new();

        match &self.scope {
            TermScope::Fields(fields) => {
                for field in fields {
                    let Some(value) = nested_lookup(record, field) else {
                        debug!(field = %field, "field absent from record");
                        continue;
                    };
                    for text in string_values(field, value)? {
                        terms.extend(self.processor.perform(text));
                    }
                }
            }
            TermScope::Dynamic => {
                for (_, text) in collect_string_fields(record) {
                    terms.extend(self.processor.perform(&text));
                }
            }
            TermScope::FieldDynamic => {
                for (path, text) in collect_string_fields(record) {
                    terms.extend(
                        self.processor
                            .perform(&text)
                            .into_iter()
                            .map(|t| format!("{}:{}", path, t)),
                    );
                }
            }
        }

        Ok(dedup(terms))
    }

    /// Unique terms of a `match` query.
    ///
    /// Field-dynamic scopes take `(field, text)`, the others take `(text)`.
    pub fn query_terms(&self, args: &[Value]) -> Result<Vec<String>> {
        let terms = match &self.scope {
            TermScope::FieldDynamic => {
                let [field, text] = args else {
                    return Err(arity_error(2, args.len()));
                };
                let field = string_arg(field)?;
                self.processor
                    .perform(string_arg(text)?)
                    .into_iter()
                    .map(|t| format!("{}:{}", field, t))
                    .collect()
            }
            _ => {
                let [text] = args else {
                    return Err(arity_error(1, args.len()));
                };
                self.processor.perform(string_arg(text)?)
            }
        };

        Ok(dedup(terms))
    }
}

fn string_values<'v>(field: &str, value: &'v Value) -> Result<Vec<&'v str>> {
    match value {
        Value::String(s) => Ok(vec![s.as_str()]),
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    Error::new(
                        ErrorKind::InvalidRecord,
                        format!("Field '{}' holds a non-string value", field),
                    )
                })
            })
            .collect(),
        _ => Err(Error::new(
            ErrorKind::InvalidRecord,
            format!("Field '{}' must be a string to be text-indexed", field),
        )),
    }
}

pub(crate) fn string_arg(value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| {
        Error::new(ErrorKind::InvalidInput, "Expected a string argument")
    })
}

pub(crate) fn arity_error(expected: usize, got: usize) -> Error {
    Error::new(
        ErrorKind::QueryConstraint,
        format!("Expected {} argument(s), got {}", expected, got),
    )
}

fn dedup(terms: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    terms.into_iter().filter(|t| seen.insert(t.clone())).collect()
}
