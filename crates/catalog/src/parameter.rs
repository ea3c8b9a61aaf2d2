use serde_json::Value;

use models::{Name, ObjectType, RawValue, ResourcePath, SpecVersion};
use validation::{Parameter, ValidationKind};

use crate::StorageRepresentation;

/// An admitted Parameter resource: its catalog coordinates, the raw spec it
/// was admitted from, and the typed validator behind it.
pub struct ParameterManager {
    pub(crate) name: Name,
    pub(crate) catalog: Name,
    pub(crate) path: ResourcePath,
    pub(crate) version: SpecVersion,
    pub(crate) spec: RawValue,
    pub(crate) parameter: Box<dyn Parameter>,
}

impl ParameterManager {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn catalog(&self) -> &Name {
        &self.catalog
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn data_type(&self) -> &'static str {
        self.parameter.data_type()
    }

    /// The declared default, or the data type's zero value.
    pub fn default(&self) -> Value {
        self.parameter.default_value()
    }

    /// Check a candidate value against the admitted spec.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationKind> {
        self.parameter.validate_value(value)
    }

    /// The form this resource takes in the catalog-object store.
    pub fn storage_representation(&self) -> StorageRepresentation {
        StorageRepresentation {
            version: self.version,
            object_type: ObjectType::ParameterSchema,
            schema: self.spec.clone(),
        }
    }
}

impl std::fmt::Debug for ParameterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterManager")
            .field("name", &self.name)
            .field("catalog", &self.catalog)
            .field("path", &self.path)
            .field("data_type", &self.data_type())
            .finish()
    }
}
