use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Diagnostics, Parameter, SchemaError, ValidationKind};
use models::RawValue;

pub const NAME: &'static str = "Array";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ArraySpec {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ArrayValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Vec<Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ArrayValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

pub fn load(spec: &RawValue) -> Result<Box<dyn Parameter>, SchemaError> {
    let spec: ArraySpec = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    Ok(Box::new(spec))
}

impl Parameter for ArraySpec {
    fn data_type(&self) -> &'static str {
        NAME
    }

    fn validate_spec(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        if let Some(validation) = &self.validation {
            if let (Some(min), Some(max)) = (validation.min_items, validation.max_items) {
                if max < min {
                    diag.push(
                        "maxItems",
                        ValidationKind::MaxValueLessThanMinValue,
                        Some(max.to_string()),
                    );
                }
            }
        }
        diag
    }

    fn validate_value(&self, value: &Value) -> Result<(), ValidationKind> {
        let items = match value.as_array() {
            Some(items) => items,
            None => return Err(ValidationKind::InvalidType),
        };
        if let Some(validation) = &self.validation {
            let len = items.len() as u64;
            if let Some(min) = validation.min_items {
                if len < min {
                    return Err(ValidationKind::ValueBelowMin);
                }
            }
            if let Some(max) = validation.max_items {
                if len > max {
                    return Err(ValidationKind::ValueAboveMax);
                }
            }
        }
        Ok(())
    }

    fn declared_default(&self) -> Option<Value> {
        self.default.clone().map(Value::from)
    }

    fn default_value(&self) -> Value {
        Value::from(self.default.clone().unwrap_or_default())
    }
}
