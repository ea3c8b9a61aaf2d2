use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Diagnostics, Parameter, SchemaError, ValidationKind};
use models::RawValue;

pub const NAME: &'static str = "Boolean";

/// Booleans carry no validation block; the only rule is the JSON type.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BooleanSpec {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

pub fn load(spec: &RawValue) -> Result<Box<dyn Parameter>, SchemaError> {
    let spec: BooleanSpec = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    Ok(Box::new(spec))
}

impl Parameter for BooleanSpec {
    fn data_type(&self) -> &'static str {
        NAME
    }

    fn validate_spec(&self) -> Diagnostics {
        Diagnostics::new()
    }

    fn validate_value(&self, value: &Value) -> Result<(), ValidationKind> {
        if value.is_boolean() {
            Ok(())
        } else {
            Err(ValidationKind::InvalidType)
        }
    }

    fn declared_default(&self) -> Option<Value> {
        self.default.map(Value::from)
    }

    fn default_value(&self) -> Value {
        Value::from(self.default.unwrap_or(false))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_booleans_validate() {
        let spec = BooleanSpec::default();
        assert!(spec.validate_value(&json!(true)).is_ok());
        assert_eq!(
            spec.validate_value(&json!("true")).unwrap_err(),
            ValidationKind::InvalidType
        );
        assert_eq!(spec.default_value(), json!(false));
    }

    #[test]
    fn test_spec_with_validation_block_is_rejected() {
        let raw =
            RawValue::from_str(r#"{"dataType":"Boolean","validation":{"minValue":1}}"#).unwrap();
        assert!(load(&raw).is_err());
    }
}
