use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Diagnostics, Parameter, SchemaError, ValidationKind};
use models::RawValue;

pub const NAME: &'static str = "Integer";

/// Spec block of an Integer parameter. All validation fields are optional
/// pointers: absence and zero are distinct.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct IntegerSpec {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<IntegerValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct IntegerValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
}

pub fn load(spec: &RawValue) -> Result<Box<dyn Parameter>, SchemaError> {
    let spec: IntegerSpec = serde_json::from_str(spec.get())
        .map_err(|err| SchemaError::ValidationFailed(err.to_string()))?;
    Ok(Box::new(spec))
}

impl IntegerValidation {
    fn step_is_coherent(&self) -> bool {
        let step = match self.step {
            Some(0) | None => return self.step.is_none(),
            Some(step) => step,
        };
        if step > 0 {
            // A positive step walks upward from minValue.
            match (self.min_value, self.max_value) {
                (None, _) => false,
                (Some(min), Some(max)) => min.checked_add(step).map_or(false, |at| at <= max),
                (Some(_), None) => true,
            }
        } else {
            // A negative step walks downward from maxValue.
            match (self.min_value, self.max_value) {
                (_, None) => false,
                (Some(min), Some(max)) => max.checked_add(step).map_or(false, |at| at >= min),
                (None, Some(_)) => true,
            }
        }
    }
}

impl Parameter for IntegerSpec {
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
        let val = match value.as_i64() {
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
            Some(step) if step > 0 => {
                // Spec validation guarantees minValue is present here.
                let min = validation.min_value.unwrap_or(0);
                if (val - min) % step != 0 {
                    return Err(ValidationKind::ValueNotInStep);
                }
            }
            Some(step) if step < 0 => {
                let max = validation.max_value.unwrap_or(0);
                if (max - val) % step != 0 {
                    return Err(ValidationKind::ValueNotInStep);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn declared_default(&self) -> Option<Value> {
        self.default.map(Value::from)
    }

    fn default_value(&self) -> Value {
        Value::from(self.default.unwrap_or(0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn spec(validation: Option<IntegerValidation>, default: Option<i64>) -> IntegerSpec {
        IntegerSpec {
            data_type: NAME.to_string(),
            validation,
            default,
        }
    }

    fn bounds(min: Option<i64>, max: Option<i64>, step: Option<i64>) -> Option<IntegerValidation> {
        Some(IntegerValidation {
            min_value: min,
            max_value: max,
            step,
        })
    }

    #[test]
    fn test_max_below_min_is_flagged_on_max_value() {
        let diag = spec(bounds(Some(10), Some(1), None), None).validate_spec();
        let first = diag.first().unwrap();
        assert_eq!(first.field, "maxValue");
        assert_eq!(first.error, ValidationKind::MaxValueLessThanMinValue);
    }

    #[test]
    fn test_step_rules() {
        // Zero step is never valid.
        let diag = spec(bounds(Some(1), Some(10), Some(0)), None).validate_spec();
        assert_eq!(diag.first().unwrap().error, ValidationKind::InvalidStepValue);
        assert_eq!(diag.first().unwrap().field, "step");

        // Positive step requires minValue.
        let diag = spec(bounds(None, Some(10), Some(2)), None).validate_spec();
        assert_eq!(diag.first().unwrap().error, ValidationKind::InvalidStepValue);

        // Negative step requires maxValue.
        let diag = spec(bounds(Some(1), None, Some(-2)), None).validate_spec();
        assert_eq!(diag.first().unwrap().error, ValidationKind::InvalidStepValue);

        // One step must stay inside the bounds.
        let diag = spec(bounds(Some(1), Some(10), Some(20)), None).validate_spec();
        assert_eq!(diag.first().unwrap().error, ValidationKind::InvalidStepValue);

        assert!(spec(bounds(Some(1), Some(10), Some(3)), None)
            .validate_spec()
            .is_empty());
        assert!(spec(bounds(Some(1), Some(10), Some(-3)), None)
            .validate_spec()
            .is_empty());
        assert!(spec(bounds(Some(1), None, Some(3)), None)
            .validate_spec()
            .is_empty());
    }

    #[test]
    fn test_value_bounds() {
        let spec = spec(bounds(Some(1), Some(10), None), None);
        assert!(spec.validate_value(&json!(7)).is_ok());
        assert_eq!(
            spec.validate_value(&json!(0)).unwrap_err(),
            ValidationKind::ValueBelowMin
        );
        assert_eq!(
            spec.validate_value(&json!(11)).unwrap_err(),
            ValidationKind::ValueAboveMax
        );
        assert_eq!(
            spec.validate_value(&json!("7")).unwrap_err(),
            ValidationKind::InvalidType
        );
    }

    #[test]
    fn test_value_steps() {
        let up = spec(bounds(Some(1), Some(10), Some(3)), None);
        assert!(up.validate_value(&json!(4)).is_ok());
        assert!(up.validate_value(&json!(7)).is_ok());
        assert_eq!(
            up.validate_value(&json!(5)).unwrap_err(),
            ValidationKind::ValueNotInStep
        );

        let down = spec(bounds(Some(1), Some(10), Some(-3)), None);
        assert!(down.validate_value(&json!(7)).is_ok());
        assert_eq!(
            down.validate_value(&json!(6)).unwrap_err(),
            ValidationKind::ValueNotInStep
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            spec(None, Some(5)).default_value(),
            json!(5)
        );
        assert_eq!(spec(None, None).default_value(), json!(0));
        assert_eq!(spec(None, None).declared_default(), None);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let raw = RawValue::from_str(r#"{"dataType":"Integer","granularity":3}"#).unwrap();
        assert!(load(&raw).is_err());
    }
}
