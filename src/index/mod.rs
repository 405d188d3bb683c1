pub mod ore;
pub mod order_encoder;
pub mod bloom_filter;
pub mod vector;
pub mod operator;
pub mod terms;
pub mod exact;
pub mod range;
pub mod ore_match;
pub mod filter_match;
pub mod field_dynamic_exact;
pub mod registry;

use serde_json::Value;
use tracing::{debug, trace, warn};
use uuid::Uuid;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{record_link, Record};
use crate::query::result_filter::RecordPredicate;
use crate::schema::settings::{IndexSettings, SchemaVersionWindow};
use self::exact::ExactIndex;
use self::field_dynamic_exact::FieldDynamicExactIndex;
use self::filter_match::FilterMatchIndex;
use self::operator::Operator;
use self::ore_match::OreMatchIndex;
use self::range::RangeIndex;
use self::registry::{IndexDescriptor, IndexKind};
use self::terms::{TermExtractor, TermScope};
use self::vector::{Constraint, IndexVector};

/// Per-kind state: only the key material and settings that kind needs
#[derive(Debug, Clone)]
pub enum IndexVariant {
    Exact(ExactIndex),
    Range(RangeIndex),
    OreMatch(OreMatchIndex),
    FilterMatch(FilterMatchIndex),
    FieldDynamicExact(FieldDynamicExactIndex),
}

/// One loaded index of a collection. Immutable once built.
#[derive(Debug, Clone)]
pub struct Index {
    id: Uuid,
    settings: IndexSettings,
    window: SchemaVersionWindow,
    descriptor: &'static IndexDescriptor,
    variant: IndexVariant,
}

impl Index {
    /// Build an index from decrypted settings.
    ///
    /// `id` must parse as a UUID and match `$indexId` in the settings.
    pub fn new(id: &str, settings: IndexSettings, window: SchemaVersionWindow) -> Result<Index> {
        let descriptor = registry::resolve(settings.kind())?;
        descriptor.construct(id, settings, window)
    }

    pub(crate) fn from_descriptor(
        descriptor: &'static IndexDescriptor,
        id: Uuid,
        settings: IndexSettings,
        window: SchemaVersionWindow,
    ) -> Result<Index> {
        let variant = match descriptor.kind {
            IndexKind::Exact => IndexVariant::Exact(ExactIndex::from_settings(&settings)?),
            IndexKind::Range => IndexVariant::Range(RangeIndex::from_settings(&settings)?),
            IndexKind::OreMatch | IndexKind::DynamicOreMatch | IndexKind::FieldDynamicOreMatch => {
                let scope = term_scope(descriptor.kind, &settings)?;
                let extractor = TermExtractor::from_mapping(scope, &settings.mapping)?;
                IndexVariant::OreMatch(OreMatchIndex::new(extractor, &settings)?)
            }
            IndexKind::FilterMatch
            | IndexKind::DynamicFilterMatch
            | IndexKind::FieldDynamicFilterMatch => {
                let scope = term_scope(descriptor.kind, &settings)?;
                let extractor = TermExtractor::from_mapping(scope, &settings.mapping)?;
                IndexVariant::FilterMatch(FilterMatchIndex::new(extractor, &settings)?)
            }
            IndexKind::FieldDynamicExact => {
                IndexVariant::FieldDynamicExact(FieldDynamicExactIndex::from_settings(&settings)?)
            }
        };

        Ok(Index {
            id,
            settings,
            window,
            descriptor,
            variant,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        self.settings.name()
    }

    pub fn kind(&self) -> IndexKind {
        self.descriptor.kind
    }

    /// Kind string as declared in the settings (may be a legacy alias)
    pub fn kind_name(&self) -> &str {
        self.settings.kind()
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn window(&self) -> SchemaVersionWindow {
        self.window
    }

    pub fn variant(&self) -> &IndexVariant {
        &self.variant
    }

    pub fn orderable(&self) -> bool {
        self.descriptor.orderable
    }

    /// False until every record has been migrated into this index
    pub fn searchable(&self) -> bool {
        self.window.searchable
    }

    pub fn unique(&self) -> bool {
        self.settings.mapping.unique
    }

    pub fn supports(&self, op: Operator) -> bool {
        self.descriptor.supports(op)
    }

    pub fn operators(&self) -> &'static [Operator] {
        self.descriptor.operators
    }

    /// True when `match` results need a client-side re-check
    pub fn needs_result_filter(&self) -> bool {
        matches!(self.variant, IndexVariant::FilterMatch(_))
    }

    /// Write path: the vector for one record, or `None` if the record has
    /// nothing this index covers.
    pub fn analyze(&self, record_id: &Uuid, record: &Record) -> Result<Option<IndexVector>> {
        let link = record_link(record_id);

        let vector = match &self.variant {
            IndexVariant::Exact(idx) => match idx.field_value(record) {
                Some(value) => Some(idx.analyze(self.id, link, value)?),
                None => {
                    warn!(
                        index = %self.name(),
                        field = %idx.field,
                        "Did not find value for field in record"
                    );
                    None
                }
            },
            IndexVariant::Range(idx) => match idx.field_value(record) {
                Some(value) => Some(idx.analyze(self.id, link, value)?),
                None => {
                    warn!(
                        index = %self.name(),
                        field = %idx.field,
                        "Did not find value for field in record"
                    );
                    None
                }
            },
            IndexVariant::OreMatch(idx) => idx.analyze(self.id, link, record)?,
            IndexVariant::FilterMatch(idx) => idx.analyze(self.id, link, record)?,
            IndexVariant::FieldDynamicExact(idx) => idx.analyze(self.id, link, record)?,
        };

        debug!(
            index = %self.name(),
            kind = %self.descriptor.canonical_name(),
            terms = vector.as_ref().map_or(0, |v| v.terms.len()),
            "analyzed record"
        );

        Ok(vector)
    }

    /// Read path: constraints for `op` applied to plaintext `args`
    pub fn generate_constraints(&self, op: Operator, args: &[Value]) -> Result<Vec<Constraint>> {
        if !self.supports(op) {
            return Err(Error::new(
                ErrorKind::UnsupportedOperator,
                format!(
                    "Operator '{}' is not supported by index '{}' of kind \"{}\"",
                    op,
                    self.name(),
                    self.kind_name()
                ),
            ));
        }

        let constraints = match &self.variant {
            IndexVariant::Exact(idx) => {
                let [value] = args else {
                    return Err(terms::arity_error(1, args.len()));
                };
                vec![idx.eq_constraint(self.id, value)?]
            }
            IndexVariant::Range(idx) => vec![idx.constraint(self.id, op, args)?],
            IndexVariant::OreMatch(idx) => vec![idx.match_constraint(self.id, args)?],
            IndexVariant::FilterMatch(idx) => vec![idx.match_constraint(self.id, args)?],
            IndexVariant::FieldDynamicExact(idx) => vec![idx.eq_constraint(self.id, args)?],
        };

        debug!(
            index = %self.name(),
            op = %op,
            constraints = constraints.len(),
            "generated constraints"
        );
        for constraint in &constraints {
            trace!(index = %self.name(), predicate = ?predicate_kind(constraint), "constraint");
        }

        Ok(constraints)
    }

    /// The result-filter check for a `match` on a bloom index; `None` for
    /// every other index/operator pair.
    pub fn result_predicate(
        &self,
        op: Operator,
        args: &[Value],
    ) -> Result<Option<RecordPredicate>> {
        match &self.variant {
            IndexVariant::FilterMatch(idx) if op == Operator::Match => {
                Ok(Some(idx.result_predicate(args)?))
            }
            _ => Ok(None),
        }
    }
}

fn term_scope(kind: IndexKind, settings: &IndexSettings) -> Result<TermScope> {
    Ok(match kind {
        IndexKind::OreMatch | IndexKind::FilterMatch => {
            TermScope::Fields(settings.mapping.required_fields(settings.name())?.to_vec())
        }
        IndexKind::DynamicOreMatch | IndexKind::DynamicFilterMatch => TermScope::Dynamic,
        _ => TermScope::FieldDynamic,
    })
}

fn predicate_kind(constraint: &Constraint) -> &'static str {
    match constraint.predicate {
        vector::Predicate::Exact { .. } => "exact",
        vector::Predicate::AnyOf { .. } => "anyOf",
        vector::Predicate::Range { .. } => "range",
        vector::Predicate::Filter { .. } => "filter",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "3c4d5e6f-7a8b-4c9d-8e0f-1a2b3c4d5e6f";

    fn settings(mapping: Value) -> IndexSettings {
        IndexSettings::from_value(&json!({
            "meta": {
                "$indexId": ID,
                "$indexName": "things",
                "$prfKey": "0123456789abcdef0123456789abcdef",
                "$prpKey": "fedcba9876543210fedcba9876543210",
                "$filterKey": "00ff00ff00ff00ff00ff00ff00ff00ff"
            },
            "mapping": mapping
        })).unwrap()
    }

    fn build(mapping: Value) -> Result<Index> {
        Index::new(ID, settings(mapping), SchemaVersionWindow::current())
    }

    #[test]
    fn id_must_parse() {
        let mapping = json!({"kind": "exact", "field": "a", "fieldType": "string"});
        let err = Index::new("notauuid", settings(mapping), SchemaVersionWindow::current())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.context, "Invalid UUID passed to Index::new: \"notauuid\"");
    }

    #[test]
    fn id_must_match_settings() {
        let other = "00000000-0000-4000-8000-000000000000";
        let mapping = json!({"kind": "exact", "field": "a", "fieldType": "string"});
        let err = Index::new(other, settings(mapping), SchemaVersionWindow::current())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.context.starts_with("Provided UUID does not match UUID in settings"));
    }

    #[test]
    fn unknown_kind() {
        let err = build(json!({"kind": "invalid"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
    }

    #[test]
    fn capabilities_by_kind() {
        let mapping = json!({"kind": "range", "field": "year", "fieldType": "uint64"});
        let range = build(mapping).unwrap();
        assert!(range.orderable());
        assert!(range.supports(Operator::Between));
        assert!(!range.supports(Operator::Match));

        let mapping = json!({"kind": "match", "fields": ["title"]});
        let window = SchemaVersionWindow::new(0, 1, false);
        let matcher = Index::new(ID, settings(mapping), window).unwrap();
        assert!(!matcher.orderable());
        assert!(!matcher.searchable());
        assert_eq!(matcher.kind(), IndexKind::OreMatch);
        assert_eq!(matcher.kind_name(), "match");
    }

    #[test]
    fn unsupported_operator_is_reported() {
        let exact = build(json!({"kind": "exact", "field": "a", "fieldType": "string"})).unwrap();
        let err = exact.generate_constraints(Operator::Lt, &[json!("x")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperator);
    }

    #[test]
    fn missing_field_is_not_an_error() {
        let exact = build(json!({"kind": "exact", "field": "a.b", "fieldType": "string"})).unwrap();
        let id = Uuid::new_v4();
        assert!(exact.analyze(&id, &json!({"a": {}})).unwrap().is_none());
        assert!(exact.analyze(&id, &json!({"a": {"b": "x"}})).unwrap().is_some());
    }

    #[test]
    fn match_without_fields_is_a_schema_error() {
        let err = build(json!({"kind": "filter-match"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
    }

    #[test]
    fn only_filter_match_registers_predicates() {
        let filter = build(json!({"kind": "dynamic-filter-match"})).unwrap();
        assert!(filter.needs_result_filter());
        assert!(filter.result_predicate(Operator::Match, &[json!("x")]).unwrap().is_some());

        let ore = build(json!({"kind": "dynamic-match"})).unwrap();
        assert!(ore.result_predicate(Operator::Match, &[json!("x")]).unwrap().is_none());
    }
}
