use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Diagnostics, Parameter, SchemaError, ValidationKind};
use models::RawValue;

pub const NAME: &'static str = "Float";

/// Spec block of a Float parameter: the Integer template over f64.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FloatSpec {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FloatValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FloatValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

pub fn load(spec: &RawValue) -> Result<Box<dyn Parameter>, SchemaError> {
    let spec: FloatSpec = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    Ok(Box::new(spec))
}

impl FloatValidation {
    fn step_is_coherent(&self) -> bool {
        let step = match self.step {
            None => return true,
            Some(step) if step == 0.0 || !step.is_finite() => return false,
            Some(step) => step,
        };
        if step > 0.0 {
            match (self.min_value, self.max_value) {
                (None, _) => false,
                (Some(min), Some(max)) => min + step <= max,
                (Some(_), None) => true,
            }
        } else {
            match (self.min_value, self.max_value) {
                (_, None) => false,
                (Some(min), Some(max)) => max + step >= min,
                (None, Some(_)) => true,
            }
        }
    }
}

impl Parameter for FloatSpec {
    fn data_type(&self) -> &'static str {
        NAME
    }

    fn validate_spec(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let validation = match &self.validation {
            Some(validation) => validation,
            None => return diag,
        };

        if let (Some(min), Some(max)) = (validation.min_value, validation.max_value) {
            if max < min {
                diag.push(
                    "maxValue",
                    ValidationKind::MaxValueLessThanMinValue,
                    Some(max.to_string()),
                );
            }
        }
        if let Some(step) = validation.step {
            if !validation.step_is_coherent() {
                diag.push(
                    "step",
                    ValidationKind::InvalidStepValue,
                    Some(step.to_string()),
                );
            }
        }
        diag
    }

    fn validate_value(&self, value: &Value) -> Result<(), ValidationKind> {
        let val = match value.as_f64() {
            Some(val) => val,
            None => return Err(ValidationKind::InvalidType),
        };
        let validation = match &self.validation {
            Some(validation) => validation,
            None => return Ok(()),
        };

        if let Some(min) = validation.min_value {
            if val < min {
                return Err(ValidationKind::ValueBelowMin);
            }
        }
        if let Some(max) = validation.max_value {
            if val > max {
                return Err(ValidationKind::ValueAboveMax);
            }
        }
        match validation.step {
            Some(step) if step > 0.0 => {
                let min = validation.min_value.unwrap_or(0.0);
                if (val - min) % step != 0.0 {
                    return Err(ValidationKind::ValueNotInStep);
                }
            }
            Some(step) if step < 0.0 => {
                let max = validation.max_value.unwrap_or(0.0);
                if (max - val) % step != 0.0 {
                    return Err(ValidationKind::ValueNotInStep);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn declared_default(&self) -> Option<Value> {
        self.default.and_then(|v| serde_json::Number::from_f64(v).map(Value::Number))
    }

    fn default_value(&self) -> Value {
        self.declared_default().unwrap_or_else(|| Value::from(0.0))
    }
}
