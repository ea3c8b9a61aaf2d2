use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Diagnostics, Parameter, SchemaError, ValidationKind};
use models::RawValue;

pub const NAME: &'static str = "String";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StringSpec {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<StringValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StringValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Anchored against the whole value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

pub fn load(spec: &RawValue) -> Result<Box<dyn Parameter>, SchemaError> {
    let spec: StringSpec = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    Ok(Box::new(spec))
}

impl StringValidation {
    fn compiled_pattern(&self) -> Option<Result<Regex, regex::Error>> {
        self.pattern
            .as_ref()
            .map(|pattern| Regex::new(&["^(?:", pattern, ")$"].concat()))
    }
}

impl Parameter for StringSpec {
    fn data_type(&self) -> &'static str {
        NAME
    }

    fn validate_spec(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let validation = match &self.validation {
            Some(validation) => validation,
            None => return diag,
        };

        if let (Some(min), Some(max)) = (validation.min_length, validation.max_length) {
            if max < min {
                diag.push(
                    "maxLength",
                    ValidationKind::MaxValueLessThanMinValue,
                    Some(max.to_string()),
                );
            }
        }
        if let Some(Err(_)) = validation.compiled_pattern() {
            diag.push(
                "pattern",
                ValidationKind::ValueInvalid,
                validation.pattern.clone(),
            );
        }
        diag
    }

    fn validate_value(&self, value: &Value) -> Result<(), ValidationKind> {
        let val = match value.as_str() {
            Some(val) => val,
            None => return Err(ValidationKind::InvalidType),
        };
        let validation = match &self.validation {
            Some(validation) => validation,
            None => return Ok(()),
        };

        let len = val.chars().count() as u64;
        if let Some(min) = validation.min_length {
            if len < min {
                return Err(ValidationKind::ValueBelowMin);
            }
        }
        if let Some(max) = validation.max_length {
            if len > max {
                return Err(ValidationKind::ValueAboveMax);
            }
        }
        if let Some(Ok(pattern)) = validation.compiled_pattern() {
            if !pattern.is_match(val) {
                return Err(ValidationKind::ValueInvalid);
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
