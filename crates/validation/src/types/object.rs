use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Diagnostics, Parameter, SchemaError, ValidationKind};
use models::RawValue;

pub const NAME: &'static str = "Object";

/// An Object is a structured map with a declared set of required keys.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ObjectSpec {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ObjectValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Map<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ObjectValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

pub fn load(spec: &RawValue) -> Result<Box<dyn Parameter>, SchemaError> {
    let spec: ObjectSpec = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    Ok(Box::new(spec))
}

impl Parameter for ObjectSpec {
    fn data_type(&self) -> &'static str {
        NAME
    }

    fn validate_spec(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        if let Some(validation) = &self.validation {
            if let Some(required) = &validation.required {
                for (i, key) in required.iter().enumerate() {
                    if key.is_empty() {
                        diag.push(
                            format!("required[{i}]"),
                            ValidationKind::ValueInvalid,
                            Some(key.clone()),
                        );
                    }
                }
            }
        }
        diag
    }

    fn validate_value(&self, value: &Value) -> Result<(), ValidationKind> {
        let entries = match value.as_object() {
            Some(entries) => entries,
            None => return Err(ValidationKind::InvalidType),
        };
        if let Some(validation) = &self.validation {
            if let Some(required) = &validation.required {
                for key in required {
                    if !entries.contains_key(key) {
                        return Err(ValidationKind::ValueInvalid);
                    }
                }
            }
        }
        Ok(())
    }

    fn declared_default(&self) -> Option<Value> {
        self.default.clone().map(Value::Object)
    }

    fn default_value(&self) -> Value {
        Value::Object(self.default.clone().unwrap_or_default())
    }
}
