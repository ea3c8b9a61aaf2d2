//! Schema admission: the data-type registry, the `Parameter` capability
//! trait, and the diagnostics machinery that collects every field error of
//! a document in a single pass.

mod error;
mod parameter;
pub mod registry;
pub mod types;

pub use error::{Diagnostics, FieldError, SchemaError, ValidationKind};
pub use parameter::Parameter;
pub use registry::Loader;

use models::{Name, RawValue, ResourcePath, SpecVersion};
use validator::Validate;

/// Load a parameter spec through the registry and fully validate it:
/// the spec's own rules first, then a declared default against the spec.
/// All diagnostics of one pass surface together as a SchemaValidation.
pub fn admit_parameter(
    version: SpecVersion,
    data_type: &str,
    spec: &RawValue,
) -> Result<Box<dyn Parameter>, SchemaError> {
    let loader = match registry::lookup(version, data_type) {
        Some(loader) => loader,
        None => {
            // Unknown types are a field failure like any other, attributed
            // to the discriminator so callers can render it in place.
            let mut diag = Diagnostics::new();
            diag.push(
                "spec.dataType",
                ValidationKind::UnsupportedDataType,
                Some(format!("{data_type:?}")),
            );
            return Err(SchemaError::SchemaValidation(diag));
        }
    };
    let parameter = loader(spec)?;

    let mut diag = parameter.validate_spec();
    if diag.is_empty() {
        // Only check a declared default once the spec itself is coherent.
        if let Some(default) = parameter.declared_default() {
            if let Err(kind) = parameter.validate_value(&default) {
                diag.push("default", kind, Some(default.to_string()));
            }
        }
    }
    diag.into_result()?;
    Ok(parameter)
}

/// Validate a Name-typed field, collecting an InvalidNameFormat diagnostic
/// which quotes the offending value.
pub fn check_name(diag: &mut Diagnostics, field: &str, name: &Name) {
    if name.validate().is_err() {
        diag.push(
            field,
            ValidationKind::InvalidNameFormat,
            Some(format!("{:?}", name.as_str())),
        );
    }
}

/// Validate a ResourcePath-typed field, collecting an InvalidResourcePath
/// diagnostic which quotes the offending value.
pub fn check_path(diag: &mut Diagnostics, field: &str, path: &ResourcePath) {
    if path.validate().is_err() {
        diag.push(
            field,
            ValidationKind::InvalidResourcePath,
            Some(format!("{:?}", path.as_str())),
        );
    }
}

#[cfg(test)]
mod test {
    use super::{admit_parameter, check_name, check_path, Diagnostics, ValidationKind};
    use models::{Name, RawValue, ResourcePath, SpecVersion};

    fn raw(s: &str) -> RawValue {
        RawValue::from_str(s).unwrap()
    }

    #[test]
    fn test_admit_valid_integer_parameter() {
        let spec = raw(
            r#"{"dataType":"Integer","validation":{"minValue":1,"maxValue":10},"default":5}"#,
        );
        let param = admit_parameter(SpecVersion::V1, "Integer", &spec).unwrap();
        assert_eq!(param.data_type(), "Integer");
        assert_eq!(param.default_value(), serde_json::json!(5));
        assert!(param.validate_value(&serde_json::json!(7)).is_ok());
        assert_eq!(
            param.validate_value(&serde_json::json!(0)).unwrap_err(),
            ValidationKind::ValueBelowMin
        );
        assert_eq!(
            param.validate_value(&serde_json::json!(11)).unwrap_err(),
            ValidationKind::ValueAboveMax
        );
    }

    #[test]
    fn test_default_out_of_bounds_reports_default_field() {
        let spec = raw(
            r#"{"dataType":"Integer","validation":{"minValue":1,"maxValue":10},"default":11}"#,
        );
        let err = admit_parameter(SpecVersion::V1, "Integer", &spec).unwrap_err();
        let diag = err.diagnostics().expect("carries diagnostics");
        let first = diag.first().unwrap();
        assert_eq!(first.field, "default");
        assert_eq!(first.error.to_string(), "value is above maximum");
    }

    #[test]
    fn test_unknown_data_type_is_attributed_to_the_discriminator() {
        let spec = raw(r#"{"dataType":"Duration"}"#);
        let err = admit_parameter(SpecVersion::V1, "Duration", &spec).unwrap_err();
        let first = err.diagnostics().unwrap().first().unwrap().clone();
        assert_eq!(first.field, "spec.dataType");
        assert_eq!(first.error, ValidationKind::UnsupportedDataType);
        assert_eq!(first.value.as_deref(), Some("\"Duration\""));
    }

    #[test]
    fn test_spec_errors_suppress_default_check() {
        // With a broken step rule, the (also out-of-step) default must not
        // add a second diagnostic.
        let spec = raw(
            r#"{"dataType":"Integer","validation":{"minValue":1,"maxValue":10,"step":0},"default":99}"#,
        );
        let err = admit_parameter(SpecVersion::V1, "Integer", &spec).unwrap_err();
        let diag = err.diagnostics().unwrap();
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.first().unwrap().field, "step");
    }

    #[test]
    fn test_admit_string_parameter_with_bad_default() {
        let spec = raw(
            r#"{"dataType":"String","validation":{"pattern":"[a-z]+"},"default":"NOPE"}"#,
        );
        let err = admit_parameter(SpecVersion::V1, "String", &spec).unwrap_err();
        let first = err.diagnostics().unwrap().first().unwrap().clone();
        assert_eq!(first.field, "default");
        assert_eq!(first.error, ValidationKind::ValueInvalid);
        assert_eq!(first.value.as_deref(), Some("\"NOPE\""));
    }

    #[test]
    fn test_admit_float_parameter_default_off_step() {
        let spec = raw(
            r#"{"dataType":"Float","validation":{"minValue":0.0,"maxValue":1.0,"step":0.25},"default":0.3}"#,
        );
        let err = admit_parameter(SpecVersion::V1, "Float", &spec).unwrap_err();
        let first = err.diagnostics().unwrap().first().unwrap().clone();
        assert_eq!(first.field, "default");
        assert_eq!(first.error, ValidationKind::ValueNotInStep);
    }

    #[test]
    fn test_admit_boolean_and_array_defaults() {
        let spec = raw(r#"{"dataType":"Boolean","default":true}"#);
        let param = admit_parameter(SpecVersion::V1, "Boolean", &spec).unwrap();
        assert_eq!(param.default_value(), serde_json::json!(true));

        let spec = raw(
            r#"{"dataType":"Array","validation":{"minItems":1},"default":[]}"#,
        );
        let err = admit_parameter(SpecVersion::V1, "Array", &spec).unwrap_err();
        let first = err.diagnostics().unwrap().first().unwrap().clone();
        assert_eq!(first.field, "default");
        assert_eq!(first.error, ValidationKind::ValueBelowMin);
    }

    #[test]
    fn test_check_name_and_path_quote_value() {
        let mut diag = Diagnostics::new();
        check_name(&mut diag, "metadata.name", &Name::new("has space"));
        check_path(&mut diag, "metadata.path", &ResourcePath::new("no-slash"));
        assert_eq!(diag.len(), 2);

        let first = diag.first().unwrap();
        assert_eq!(first.error, ValidationKind::InvalidNameFormat);
        assert_eq!(first.value.as_deref(), Some("\"has space\""));
    }
}
