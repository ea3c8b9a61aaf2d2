use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Entity identifiers are v4 UUIDs persisted as Postgres UUID columns.
// Each gets its own newtype so a workspace id can never be passed where a
// variant id is expected, which matters for the repo_id convention of the
// collection layer.

macro_rules! uuid_id_types {
    (
        $(#[$outer:meta])*
        $vis:vis struct $Wrapper:ident;

        $($rest:tt)*
    ) => {

        $(#[$outer])*
        #[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "sqlx-support", derive(sqlx::Decode, sqlx::Encode))]
        pub struct $Wrapper(Uuid);

        impl $Wrapper {
            /// A freshly generated random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $Wrapper {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $Wrapper {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        #[cfg(feature = "sqlx-support")]
        impl sqlx::Type<sqlx::Postgres> for $Wrapper {
            fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
                <Uuid as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        uuid_id_types! {
            $($rest)*
        }
    };

    () => {};
}

uuid_id_types! {
    /// Identifier of a catalog within a project.
    pub struct CatalogId;

    /// Identifier of a variant within a catalog.
    pub struct VariantId;

    /// Identifier of a mutable workspace branched from a version.
    pub struct WorkspaceId;

    /// Identifier of a schema directory owned by a version or workspace.
    pub struct DirectoryId;

    /// Identifier of a denormalized collection row.
    pub struct CollectionId;
}

/// RepoId disambiguates where a collection row lives: the workspace id while
/// editing in a workspace, or the variant id at the committed head.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Decode, sqlx::Encode))]
pub struct RepoId(Uuid);

impl RepoId {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<WorkspaceId> for RepoId {
    fn from(id: WorkspaceId) -> Self {
        Self(id.as_uuid())
    }
}

impl From<VariantId> for RepoId {
    fn from(id: VariantId) -> Self {
        Self(id.as_uuid())
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(feature = "sqlx-support")]
impl sqlx::Type<sqlx::Postgres> for RepoId {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <Uuid as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(test)]
mod test {
    use super::{RepoId, VariantId, WorkspaceId};

    #[test]
    fn test_display_round_trip() {
        let id = VariantId::generate();
        let parsed: VariantId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_repo_id_conversions() {
        let variant = VariantId::generate();
        let workspace = WorkspaceId::generate();
        assert_eq!(RepoId::from(variant).as_uuid(), variant.as_uuid());
        assert_ne!(RepoId::from(workspace), RepoId::from(variant));
    }
}
