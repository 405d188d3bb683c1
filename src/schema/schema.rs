use std::collections::BTreeMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use crate::core::error::{Error, Result};
use crate::index::registry::{self, IndexDescriptor, IndexKind};
use crate::schema::settings::{FieldType, IndexMapping, IndexSettings, SchemaVersionWindow};

/// User-facing collection schema:
/// `{"type": {field: type}, "indexes": {name: mapping}}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollectionSchema {
    #[serde(rename = "type", default)]
    pub record_type: BTreeMap<String, FieldType>,
    #[serde(default)]
    pub indexes: BTreeMap<String, IndexMapping>,
}

impl CollectionSchema {
    pub fn from_value(value: &Value) -> Result<Self> {
        CollectionSchema::deserialize(value)
            .map_err(|e| Error::invalid_schema(format!("Malformed collection schema: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::invalid_schema(format!("Malformed collection schema: {}", e)))
    }

    /// Settings for a brand-new collection: every index gets a new id and
    /// new keys.
    pub fn compile<R: Rng>(&self, rng: &mut R) -> Result<Vec<IndexSettings>> {
        self.compile_migration(&[], rng)
    }

    /// Settings for a collection being migrated. An index whose name and
    /// compiled mapping match an existing one keeps that index's `meta`, so
    /// its terms stay valid; everything else is generated fresh.
    pub fn compile_migration<R: Rng>(
        &self,
        existing: &[IndexSettings],
        rng: &mut R,
    ) -> Result<Vec<IndexSettings>> {
        let mut compiled = Vec::with_capacity(self.indexes.len());
        let mut reused_count = 0;

        for (name, mapping) in &self.indexes {
            let (descriptor, mapping) = self.compile_mapping(name, mapping)?;

            let reused = existing
                .iter()
                .find(|cur| cur.name() == name && cur.mapping == mapping)
                .map(|cur| cur.meta.clone());

            let meta = match reused {
                Some(meta) => {
                    debug!(index = %name, "keeping existing index metadata");
                    reused_count += 1;
                    meta
                }
                None => descriptor.generate_meta(name, rng),
            };

            let settings = IndexSettings { meta, mapping };

            // Fail now on anything that would stop the index from loading
            descriptor.construct(
                &settings.meta.index_id,
                settings.clone(),
                SchemaVersionWindow::current(),
            )?;
            compiled.push(settings);
        }

        info!(indexes = compiled.len(), reused = reused_count, "compiled collection schema");
        Ok(compiled)
    }

    fn compile_mapping(
        &self,
        name: &str,
        mapping: &IndexMapping,
    ) -> Result<(&'static IndexDescriptor, IndexMapping)> {
        let declared = registry::resolve(&mapping.kind)?;

        // New collections store match indexes as bloom filters; ORE matching
        // has to be asked for by its explicit `*-ore-match` name.
        let kind = match mapping.kind.as_str() {
            "match" => "filter-match",
            "dynamic-match" => "dynamic-filter-match",
            "field-dynamic-match" => "field-dynamic-filter-match",
            _ => declared.canonical_name(),
        };
        let descriptor = registry::resolve(kind)?;

        if mapping.unique && !descriptor.uniqueness_supported {
            return Err(Error::invalid_schema(format!(
                "Index '{}' of kind \"{}\" does not support uniqueness",
                name, kind
            )));
        }

        let field_type = match descriptor.kind {
            IndexKind::Exact | IndexKind::Range => {
                let field = mapping.required_field(name)?;
                *self.record_type.get(field).ok_or_else(|| {
                    Error::invalid_schema(format!(
                        "Index '{}' refers to field '{}' which has no declared type",
                        name, field
                    ))
                })?
            }
            _ => FieldType::String,
        };

        let mut compiled = mapping.clone();
        compiled.kind = kind.to_string();
        compiled.field_type = Some(field_type);
        Ok((descriptor, compiled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn movies() -> CollectionSchema {
        CollectionSchema::from_value(&json!({
            "type": {"title": "string", "year": "uint64"},
            "indexes": {
                "exactTitle": {"kind": "exact", "field": "title"},
                "year": {"kind": "range", "field": "year"},
                "title": {
                    "kind": "match",
                    "fields": ["title"],
                    "tokenFilters": [{"kind": "downcase"}]
                },
                "oreTitle": {"kind": "dynamic-ore-match"}
            }
        })).unwrap()
    }

    #[test]
    fn field_types_and_kind_upgrades() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = movies().compile(&mut rng).unwrap();
        let by_name: BTreeMap<&str, &IndexSettings> =
            settings.iter().map(|s| (s.name(), s)).collect();

        assert_eq!(by_name["year"].mapping.field_type, Some(FieldType::Uint64));
        assert_eq!(by_name["exactTitle"].mapping.field_type, Some(FieldType::String));
        assert_eq!(by_name["title"].kind(), "filter-match");
        assert!(by_name["title"].meta.filter_key.is_some());
        assert_eq!(by_name["oreTitle"].kind(), "dynamic-ore-match");
        assert!(by_name["oreTitle"].meta.prf_key.is_some());
    }

    #[test]
    fn undeclared_field_type() {
        let schema = CollectionSchema::from_value(&json!({
            "indexes": {"year": {"kind": "range", "field": "year"}}
        })).unwrap();
        let err = schema.compile(&mut StdRng::seed_from_u64(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
    }

    #[test]
    fn uniqueness_only_on_scalar_kinds() {
        let schema = CollectionSchema::from_value(&json!({
            "type": {"title": "string"},
            "indexes": {"title": {"kind": "filter-match", "fields": ["title"], "unique": true}}
        })).unwrap();
        let err = schema.compile(&mut StdRng::seed_from_u64(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);

        let schema = CollectionSchema::from_value(&json!({
            "type": {"email": "string"},
            "indexes": {"email": {"kind": "exact", "field": "email", "unique": true}}
        })).unwrap();
        assert!(schema.compile(&mut StdRng::seed_from_u64(3)).is_ok());
    }

    #[test]
    fn unknown_kind() {
        let schema = CollectionSchema::from_value(&json!({
            "indexes": {"x": {"kind": "fulltext"}}
        })).unwrap();
        let err = schema.compile(&mut StdRng::seed_from_u64(4)).unwrap_err();
        assert_eq!(err.context, "Unknown index kind \"fulltext\"");
    }

    #[test]
    fn migration_keeps_unchanged_indexes() {
        let mut rng = StdRng::seed_from_u64(5);
        let before = movies().compile(&mut rng).unwrap();

        let mut changed = movies();
        changed.indexes.get_mut("year").unwrap().kind = "exact".to_string();
        let after = changed.compile_migration(&before, &mut rng).unwrap();

        let find = |list: &[IndexSettings], name: &str| {
            list.iter().find(|s| s.name() == name).unwrap().meta.clone()
        };
        assert_eq!(find(&before, "title"), find(&after, "title"));
        assert_ne!(find(&before, "year").index_id, find(&after, "year").index_id);
    }
}
