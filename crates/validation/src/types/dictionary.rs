use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Diagnostics, Parameter, SchemaError, ValidationKind};
use models::RawValue;

pub const NAME: &'static str = "Dictionary";

/// A Dictionary is a free-form map of string keys to values, bounded only
/// in size.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DictionarySpec {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<DictionaryValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Map<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DictionaryValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
}

pub fn load(spec: &RawValue) -> Result<Box<dyn Parameter>, SchemaError> {
    let spec: DictionarySpec = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    Ok(Box::new(spec))
}

impl Parameter for DictionarySpec {
    fn data_type(&self) -> &'static str {
        NAME
    }

    fn validate_spec(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        if let Some(validation) = &self.validation {
            if let (Some(min), Some(max)) =
                (validation.min_properties, validation.max_properties)
            {
                if max < min {
                    diag.push(
                        "maxProperties",
                        ValidationKind::MaxValueLessThanMinValue,
                        Some(max.to_string()),
                    );
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
            let len = entries.len() as u64;
            if let Some(min) = validation.min_properties {
                if len < min {
                    return Err(ValidationKind::ValueBelowMin);
                }
            }
            if let Some(max) = validation.max_properties {
                if len > max {
                    return Err(ValidationKind::ValueAboveMax);
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
