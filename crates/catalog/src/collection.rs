use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use models::{Name, ObjectType, RawValue, ResourcePath, SpecVersion};

use crate::StorageRepresentation;

/// The spec block of a Collection resource: the collection schema it
/// instantiates and per-parameter value overlays.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CollectionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Name>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, Value>,
}

/// An admitted Collection resource.
#[derive(Debug)]
pub struct CollectionManager {
    pub(crate) name: Name,
    pub(crate) catalog: Name,
    pub(crate) path: ResourcePath,
    pub(crate) version: SpecVersion,
    pub(crate) spec: RawValue,
    pub(crate) parsed: CollectionSpec,
}

impl CollectionManager {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn catalog(&self) -> &Name {
        &self.catalog
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The collection schema this collection instantiates. Admission
    /// guarantees it is present and well-formed.
    pub fn schema(&self) -> &Name {
        self.parsed.schema.as_ref().expect("admission requires a schema")
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.parsed.values
    }

    pub fn storage_representation(&self) -> StorageRepresentation {
        StorageRepresentation {
            version: self.version,
            object_type: ObjectType::CatalogCollection,
            schema: self.spec.clone(),
        }
    }
}
