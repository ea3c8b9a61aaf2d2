//! Project-wide typed wrappers and very simple structures which identify
//! or name catalog concepts, and must be referenced from multiple crates.

mod ids;
mod objects;
mod raw_value;
mod references;
mod resources;

pub use ids::{CatalogId, CollectionId, DirectoryId, RepoId, VariantId, WorkspaceId};
pub use objects::{
    CatalogObject, Directory, HashDigest, InvalidDigest, ObjectRef, ObjectType, Reference,
};
pub use raw_value::RawValue;
pub use references::{
    Label, Name, Namespace, ProjectId, ResourcePath, TenantId, NAME_RE,
};
pub use resources::{Metadata, Resource, ResourceKind, SpecVersion, VersionHeader};

/// The name of the variant every catalog is created with.
pub const DEFAULT_VARIANT: &str = "default";

/// The namespace collections land in when none is named.
pub const DEFAULT_NAMESPACE: &str = "default";
