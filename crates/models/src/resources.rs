use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Name, Namespace, RawValue, ResourcePath};

/// The recognized resource-envelope versions. Parsing is strict: anything
/// other than the enumerated set is rejected up front.
#[derive(Serialize, Deserialize, JsonSchema, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecVersion {
    #[serde(rename = "v1")]
    V1,
}

impl std::str::FromStr for SpecVersion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(SpecVersion::V1),
            _ => Err(()),
        }
    }
}

impl std::convert::AsRef<str> for SpecVersion {
    fn as_ref(&self) -> &str {
        match *self {
            SpecVersion::V1 => "v1",
        }
    }
}

impl std::fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// The kind of resource an envelope declares.
#[derive(Serialize, Deserialize, JsonSchema, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Parameter,
    Collection,
}

impl std::str::FromStr for ResourceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Parameter" => Ok(ResourceKind::Parameter),
            "Collection" => Ok(ResourceKind::Collection),
            _ => Err(()),
        }
    }
}

impl std::convert::AsRef<str> for ResourceKind {
    fn as_ref(&self) -> &str {
        match *self {
            ResourceKind::Parameter => "Parameter",
            ResourceKind::Collection => "Collection",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Just the version header of an envelope, parsed ahead of everything else
/// so unrecognized versions are rejected before any other diagnostics.
#[derive(Deserialize, Debug)]
pub struct VersionHeader {
    #[serde(default)]
    pub version: Option<String>,
}

/// Resource metadata: where in the catalog the resource lives. Fields are
/// deserialized permissively; the admission pipeline validates presence and
/// formats so that all diagnostics of a document surface in one pass.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Namespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<ResourcePath>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// The outer resource envelope as submitted. Every field is optional at the
/// serde layer: missing pieces become structured diagnostics rather than
/// opaque parse failures.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<RawValue>,
}
