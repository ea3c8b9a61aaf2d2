use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;

use crate::{Name, RawValue, ResourcePath};

/// The kind of blob a catalog-object row holds, and equally the kind of a
/// schema directory. Dispatch over it is exhaustive: each kind has its own
/// directory table.
#[derive(Serialize, Deserialize, JsonSchema, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    ParameterSchema,
    CollectionSchema,
    CatalogCollection,
}

impl std::str::FromStr for ObjectType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parameter_schema" => Ok(ObjectType::ParameterSchema),
            "collection_schema" => Ok(ObjectType::CollectionSchema),
            "catalog_collection" => Ok(ObjectType::CatalogCollection),
            _ => Err(()),
        }
    }
}

impl std::convert::AsRef<str> for ObjectType {
    fn as_ref(&self) -> &str {
        // These strings match what's used by serde, and also the
        // catalog_object_type enum in the database.
        match *self {
            ObjectType::ParameterSchema => "parameter_schema",
            ObjectType::CollectionSchema => "collection_schema",
            ObjectType::CatalogCollection => "catalog_collection",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid content digest {0:?}: expected 128 lowercase hex characters")]
pub struct InvalidDigest(String);

/// HashDigest is the content address of a catalog object: the lowercase hex
/// SHA-512 of its uncompressed canonical JSON bytes.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Decode, sqlx::Encode))]
pub struct HashDigest(String);

impl HashDigest {
    pub const HEX_LEN: usize = 128;

    /// Digest the given canonical bytes.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for HashDigest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == Self::HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidDigest(s.to_string()))
        }
    }
}

impl std::fmt::Display for HashDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HashDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "sqlx-support")]
impl sqlx::Type<sqlx::Postgres> for HashDigest {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

/// A single entry of an ObjectRef `references` list, naming a directory path
/// which refers to the object.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct Reference {
    pub name: ResourcePath,
}

/// ObjectRef is the value a schema directory maps a path to: a pointer to a
/// content-addressed blob, its optional base schema, and the paths which
/// reference it.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct ObjectRef {
    pub hash: HashDigest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_schema: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
}

impl ObjectRef {
    pub fn new(hash: HashDigest) -> Self {
        Self {
            hash,
            base_schema: None,
            references: None,
        }
    }
}

/// The at-rest form of a schema directory: a flat JSON map from canonical
/// path keys to ObjectRefs. There is no in-memory tree; tree-shaped queries
/// are string-suffix matches over this map.
pub type Directory = BTreeMap<String, ObjectRef>;

/// An immutable content-addressed blob. `data` holds the uncompressed
/// canonical JSON; any storage compression is applied and stripped by the
/// object store.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogObject {
    pub hash: HashDigest,
    pub object_type: ObjectType,
    pub version: String,
    pub data: RawValue,
}

impl CatalogObject {
    /// Build an object from its canonical payload, computing the address.
    pub fn new(object_type: ObjectType, version: impl Into<String>, data: RawValue) -> Self {
        let hash = data.digest();
        Self {
            hash,
            object_type,
            version: version.into(),
            data,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{CatalogObject, Directory, HashDigest, ObjectRef, ObjectType};
    use crate::RawValue;

    #[test]
    fn test_digest_is_lowercase_sha512_hex() {
        let digest = HashDigest::of(b"abc");
        assert_eq!(digest.as_str().len(), HashDigest::HEX_LEN);
        // Well-known SHA-512 of "abc".
        assert!(digest.as_str().starts_with("ddaf35a193617aba"));
        assert_eq!(digest, digest.as_str().parse().unwrap());
    }

    #[test]
    fn test_digest_rejects_bad_input() {
        assert!("xyz".parse::<HashDigest>().is_err());
        let upper = HashDigest::of(b"abc").as_str().to_uppercase();
        assert!(upper.parse::<HashDigest>().is_err());
    }

    #[test]
    fn test_object_address_tracks_payload() {
        let a = CatalogObject::new(
            ObjectType::ParameterSchema,
            "v1",
            RawValue::from_str(r#"{"dataType":"Integer"}"#).unwrap(),
        );
        let b = CatalogObject::new(
            ObjectType::ParameterSchema,
            "v1",
            RawValue::from_str(r#"{"dataType":"String"}"#).unwrap(),
        );
        assert_ne!(a.hash, b.hash);
        assert_eq!(a.hash, HashDigest::of(a.data.canonical_bytes()));
        assert_eq!(a.hash, a.data.digest());
    }

    #[test]
    fn test_directory_round_trips_and_skips_empty_fields() {
        let mut dir = Directory::new();
        dir.insert(
            "/regions/east".to_string(),
            ObjectRef::new(HashDigest::of(b"blob")),
        );

        let json = serde_json::to_string(&dir).unwrap();
        assert!(!json.contains("references"));
        assert!(!json.contains("base_schema"));

        let parsed: Directory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, dir);
    }
}
