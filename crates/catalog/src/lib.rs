//! The catalog facade: resource admission ([`new_resource`]) producing
//! kind-specific managers, and the transactional lifecycles layered over
//! the SQL crate (catalog creation, workspace commit).

mod collection;
mod commit;
mod lifecycle;
mod parameter;
mod resource;

pub use collection::{CollectionManager, CollectionSpec};
pub use commit::commit_workspace;
pub use lifecycle::create_catalog;
pub use parameter::ParameterManager;
pub use resource::{new_resource, ResourceManager};

use models::{CatalogObject, HashDigest, ObjectType, RawValue, SpecVersion};

/// What a resource looks like in the catalog-object store: the envelope
/// version, the object kind, and the canonical spec bytes that are hashed
/// for the content address.
#[derive(Debug, Clone)]
pub struct StorageRepresentation {
    pub version: SpecVersion,
    pub object_type: ObjectType,
    pub schema: RawValue,
}

impl StorageRepresentation {
    /// The content address of the canonical bytes.
    pub fn hash(&self) -> HashDigest {
        self.schema.digest()
    }

    pub fn into_catalog_object(self) -> CatalogObject {
        CatalogObject::new(self.object_type, self.version.to_string(), self.schema)
    }
}
