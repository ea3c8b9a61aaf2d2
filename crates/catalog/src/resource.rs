use serde::Deserialize;

use models::{
    Metadata, Name, RawValue, Resource, ResourceKind, ResourcePath, SpecVersion, VersionHeader,
};
use validation::{
    admit_parameter, check_name, check_path, Diagnostics, SchemaError, ValidationKind,
};

use crate::{CollectionManager, CollectionSpec, ParameterManager};

/// A validated resource of some (version, kind), holding exactly one of the
/// two inner managers.
#[derive(Debug)]
pub struct ResourceManager {
    version: SpecVersion,
    kind: ResourceKind,
    parameter: Option<ParameterManager>,
    collection: Option<CollectionManager>,
}

impl ResourceManager {
    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn parameter_manager(&self) -> Option<&ParameterManager> {
        self.parameter.as_ref()
    }

    pub fn collection_manager(&self) -> Option<&CollectionManager> {
        self.collection.as_ref()
    }
}

/// Admit a raw resource document:
/// reject empty input, parse and gate the version header, then hand off to
/// the version-specific constructor.
pub fn new_resource(raw: &str) -> Result<ResourceManager, SchemaError> {
    if raw.trim().is_empty() {
        return Err(SchemaError::EmptySchema);
    }

    let header: VersionHeader = serde_json::from_str(raw)
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    let version = match header.version.as_deref() {
        None | Some("") => return Err(SchemaError::InvalidVersion(String::new())),
        Some(version) => version
            .parse::<SpecVersion>()
            .map_err(|()| SchemaError::InvalidVersion(version.to_string()))?,
    };

    match version {
        SpecVersion::V1 => new_resource_v1(raw),
    }
}

// The `dataType` discriminator of a parameter spec block, pulled out ahead
// of the full typed parse.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecHeader {
    #[serde(default)]
    data_type: Option<String>,
}

fn new_resource_v1(raw: &str) -> Result<ResourceManager, SchemaError> {
    let resource: Resource = serde_json::from_str(raw)
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;

    // The envelope requires all four of version, kind, metadata, and spec.
    // Everything reportable in one pass is collected before dispatch.
    let mut diag = Diagnostics::new();

    let kind = match resource.kind.as_deref() {
        None | Some("") => {
            diag.push("kind", ValidationKind::MissingRequiredAttribute, None);
            None
        }
        Some(kind) => match kind.parse::<ResourceKind>() {
            Ok(kind) => Some(kind),
            Err(()) => return Err(SchemaError::InvalidKind(kind.to_string())),
        },
    };
    if resource.metadata.is_none() {
        diag.push("metadata", ValidationKind::MissingRequiredAttribute, None);
    }
    if resource.spec.is_none() {
        diag.push("spec", ValidationKind::MissingRequiredAttribute, None);
    }

    let metadata = resource.metadata.unwrap_or_default();
    let (name, catalog, path) = validate_metadata(&mut diag, &metadata);
    diag.into_result()?;

    // All required pieces are present past this point.
    let (kind, spec) = (
        kind.expect("kind presence was validated"),
        resource.spec.expect("spec presence was validated"),
    );

    match kind {
        ResourceKind::Parameter => {
            let parameter = admit_parameter_v1(&spec)?;
            Ok(ResourceManager {
                version: SpecVersion::V1,
                kind,
                parameter: Some(ParameterManager {
                    name,
                    catalog,
                    path,
                    version: SpecVersion::V1,
                    spec,
                    parameter,
                }),
                collection: None,
            })
        }
        ResourceKind::Collection => {
            let parsed = admit_collection_v1(&spec)?;
            Ok(ResourceManager {
                version: SpecVersion::V1,
                kind,
                parameter: None,
                collection: Some(CollectionManager {
                    name,
                    catalog,
                    path,
                    version: SpecVersion::V1,
                    spec,
                    parsed,
                }),
            })
        }
    }
}

/// Presence and format checks of the metadata block, collected rather than
/// short-circuited. Returns the (possibly placeholder) typed fields; the
/// placeholders are only reachable when diagnostics were recorded.
fn validate_metadata(
    diag: &mut Diagnostics,
    metadata: &Metadata,
) -> (Name, Name, ResourcePath) {
    for (field, value) in [
        ("metadata.name", &metadata.name),
        ("metadata.catalog", &metadata.catalog),
    ] {
        match value {
            None => diag.push(field, ValidationKind::MissingRequiredAttribute, None),
            Some(name) => check_name(diag, field, name),
        }
    }
    if let Some(variant) = &metadata.variant {
        check_name(diag, "metadata.variant", variant);
    }
    if let Some(namespace) = &metadata.namespace {
        check_name(diag, "metadata.namespace", &Name::new(namespace.as_str()));
    }
    match &metadata.path {
        None => diag.push("metadata.path", ValidationKind::MissingRequiredAttribute, None),
        Some(path) => check_path(diag, "metadata.path", path),
    }

    (
        metadata.name.clone().unwrap_or_default(),
        metadata.catalog.clone().unwrap_or_default(),
        metadata.path.clone().unwrap_or_default(),
    )
}

fn admit_parameter_v1(
    spec: &RawValue,
) -> Result<Box<dyn validation::Parameter>, SchemaError> {
    let header: SpecHeader = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    let data_type = match header.data_type.as_deref() {
        None | Some("") => {
            let mut diag = Diagnostics::new();
            diag.push("spec.dataType", ValidationKind::MissingRequiredAttribute, None);
            return Err(SchemaError::SchemaValidation(diag));
        }
        Some(data_type) => data_type.to_string(),
    };
    admit_parameter(SpecVersion::V1, &data_type, spec)
}

fn admit_collection_v1(spec: &RawValue) -> Result<CollectionSpec, SchemaError> {
    let parsed: CollectionSpec = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;

    let mut diag = Diagnostics::new();
    match &parsed.schema {
        None => diag.push("spec.schema", ValidationKind::MissingRequiredAttribute, None),
        Some(schema) => check_name(&mut diag, "spec.schema", schema),
    }
    diag.into_result()?;
    Ok(parsed)
}
