use std::collections::HashMap;
use std::sync::LazyLock;
use rand::Rng;
use uuid::Uuid;
use crate::core::error::{Error, Result};
use crate::index::operator::Operator;
use crate::index::Index;
use crate::schema::settings::{IndexMeta, IndexSettings, KeyMaterial, SchemaVersionWindow};

/// Concrete index variant a kind string resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Exact,
    Range,
    OreMatch,
    DynamicOreMatch,
    FieldDynamicOreMatch,
    FilterMatch,
    DynamicFilterMatch,
    FieldDynamicFilterMatch,
    FieldDynamicExact,
}

/// Which key material a kind needs in its `meta`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// `$prfKey` + `$prpKey`
    Ore,
    /// `$filterKey`
    Filter,
}

#[derive(Debug)]
pub struct IndexDescriptor {
    pub kind: IndexKind,
    /// Canonical name first, then legacy aliases
    pub kind_names: &'static [&'static str],
    pub key_policy: KeyPolicy,
    pub operators: &'static [Operator],
    pub orderable: bool,
    pub uniqueness_supported: bool,
}

const RANGE_OPS: &[Operator] = &[
    Operator::Eq,
    Operator::Lt,
    Operator::Lte,
    Operator::Gt,
    Operator::Gte,
    Operator::Between,
];

static DESCRIPTORS: &[IndexDescriptor] = &[
    IndexDescriptor {
        kind: IndexKind::Exact,
        kind_names: &["exact"],
        key_policy: KeyPolicy::Ore,
        operators: &[Operator::Eq],
        orderable: false,
        uniqueness_supported: true,
    },
    IndexDescriptor {
        kind: IndexKind::Range,
        kind_names: &["range"],
        key_policy: KeyPolicy::Ore,
        operators: RANGE_OPS,
        orderable: true,
        uniqueness_supported: true,
    },
    IndexDescriptor {
        kind: IndexKind::OreMatch,
        kind_names: &["ore-match", "match"],
        key_policy: KeyPolicy::Ore,
        operators: &[Operator::Match],
        orderable: false,
        uniqueness_supported: false,
    },
    IndexDescriptor {
        kind: IndexKind::DynamicOreMatch,
        kind_names: &["dynamic-ore-match", "dynamic-match"],
        key_policy: KeyPolicy::Ore,
        operators: &[Operator::Match],
        orderable: false,
        uniqueness_supported: false,
    },
    IndexDescriptor {
        kind: IndexKind::FieldDynamicOreMatch,
        kind_names: &["field-dynamic-ore-match", "field-dynamic-match"],
        key_policy: KeyPolicy::Ore,
        operators: &[Operator::Match],
        orderable: false,
        uniqueness_supported: false,
    },
    IndexDescriptor {
        kind: IndexKind::FilterMatch,
        kind_names: &["filter-match"],
        key_policy: KeyPolicy::Filter,
        operators: &[Operator::Match],
        orderable: false,
        uniqueness_supported: false,
    },
    IndexDescriptor {
        kind: IndexKind::DynamicFilterMatch,
        kind_names: &["dynamic-filter-match"],
        key_policy: KeyPolicy::Filter,
        operators: &[Operator::Match],
        orderable: false,
        uniqueness_supported: false,
    },
    IndexDescriptor {
        kind: IndexKind::FieldDynamicFilterMatch,
        kind_names: &["field-dynamic-filter-match"],
        key_policy: KeyPolicy::Filter,
        operators: &[Operator::Match],
        orderable: false,
        uniqueness_supported: false,
    },
    IndexDescriptor {
        kind: IndexKind::FieldDynamicExact,
        kind_names: &["field-dynamic-exact"],
        key_policy: KeyPolicy::Ore,
        operators: &[Operator::Eq],
        orderable: false,
        uniqueness_supported: false,
    },
];

static REGISTRY: LazyLock<Result<IndexRegistry>> =
    LazyLock::new(|| IndexRegistry::from_descriptors(DESCRIPTORS));

impl IndexDescriptor {
    pub fn canonical_name(&self) -> &'static str {
        self.kind_names[0]
    }

    pub fn supports(&self, op: Operator) -> bool {
        self.operators.contains(&op)
    }

    /// Fresh `meta` for a new index of this kind: new id and new keys
    pub fn generate_meta<R: Rng>(&self, name: &str, rng: &mut R) -> IndexMeta {
        let id = uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid();
        let mut meta = IndexMeta {
            index_id: id.to_string(),
            index_name: name.to_string(),
            prf_key: None,
            prp_key: None,
            filter_key: None,
        };

        match self.key_policy {
            KeyPolicy::Ore => {
                meta.prf_key = Some(KeyMaterial::generate(rng).to_hex());
                meta.prp_key = Some(KeyMaterial::generate(rng).to_hex());
            }
            KeyPolicy::Filter => {
                meta.filter_key = Some(KeyMaterial::generate(rng).to_hex());
            }
        }

        meta
    }

    pub fn construct(
        &'static self,
        id: &str,
        settings: IndexSettings,
        window: SchemaVersionWindow,
    ) -> Result<Index> {
        let id = Uuid::parse_str(id)
            .map_err(|_| Error::internal(format!("Invalid UUID passed to Index::new: {:?}", id)))?;
        let settings_id = settings.index_uuid()?;

        if id != settings_id {
            return Err(Error::internal(format!(
                "Provided UUID does not match UUID in settings ({} != {})",
                id, settings_id
            )));
        }

        Index::from_descriptor(self, id, settings, window)
    }
}

/// Kind string -> descriptor lookup table, built once
#[derive(Debug)]
pub struct IndexRegistry {
    by_name: HashMap<&'static str, &'static IndexDescriptor>,
}

impl IndexRegistry {
    /// Fails if two descriptors claim the same kind string
    pub fn from_descriptors(descriptors: &'static [IndexDescriptor]) -> Result<Self> {
        let mut by_name = HashMap::new();

        for descriptor in descriptors {
            for name in descriptor.kind_names {
                if let Some(existing) = by_name.insert(*name, descriptor) {
                    return Err(Error::internal(format!(
                        "Index kind \"{}\" is registered for both {:?} and {:?}",
                        name, existing.kind, descriptor.kind
                    )));
                }
            }
        }

        Ok(IndexRegistry { by_name })
    }

    /// The built-in registry
    pub fn global() -> Result<&'static IndexRegistry> {
        REGISTRY.as_ref().map_err(Clone::clone)
    }

    pub fn resolve(&self, kind: &str) -> Result<&'static IndexDescriptor> {
        self.by_name
            .get(kind)
            .copied()
            .ok_or_else(|| Error::invalid_schema(format!("Unknown index kind {:?}", kind)))
    }

    pub fn kind_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }
}

/// Resolve a kind through the built-in registry
pub fn resolve(kind: &str) -> Result<&'static IndexDescriptor> {
    IndexRegistry::global()?.resolve(kind)
}
