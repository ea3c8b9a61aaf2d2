//! Postgres data access for the catalog: scoped sessions, one module per
//! entity, the content-addressed object store, and the schema-directory
//! engine. Functions take an executor (or a transaction for multi-step
//! lifecycles) and a [`RequestContext`] carrying the tenant/project scope.

pub mod catalogs;
pub mod collections;
pub mod directories;
pub mod namespaces;
pub mod objects;
pub mod projects;
pub mod tenants;
pub mod variants;
pub mod versions;
pub mod workspaces;

mod error;
mod info;
mod scope;

pub use directories::DirectoryOwner;
pub use error::{Result, StorageError};
pub use info::Info;
pub use scope::{apply_scope, Config, RequestContext, ScopedPool};
