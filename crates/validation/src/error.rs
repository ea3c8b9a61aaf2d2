use serde::Serialize;
use std::fmt;

/// The closed set of field-level validation failures. A kind renders as the
/// exact diagnostic string surfaced to callers, so the HTTP layer can show
/// it verbatim next to the offending field.
#[derive(thiserror::Error, Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValidationKind {
    #[error("missing required attribute")]
    MissingRequiredAttribute,
    #[error("invalid name format")]
    InvalidNameFormat,
    #[error("invalid resource path")]
    InvalidResourcePath,
    #[error("invalid step value")]
    InvalidStepValue,
    #[error("max value is less than min value")]
    MaxValueLessThanMinValue,
    #[error("unsupported data type")]
    UnsupportedDataType,
    #[error("invalid type")]
    InvalidType,
    #[error("value is below minimum")]
    ValueBelowMin,
    #[error("value is above maximum")]
    ValueAboveMax,
    #[error("value is not in step")]
    ValueNotInStep,
    #[error("value is invalid")]
    ValueInvalid,
}

/// One diagnostic: the dotted path of the field at fault, what went wrong,
/// and the offending value when there is one to quote.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub error: ValidationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: {} ({})", self.field, self.error, value),
            None => write!(f, "{}: {}", self.field, self.error),
        }
    }
}

/// Diagnostics accumulate every field error of a document in one validation
/// pass, rather than failing on the first.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Diagnostics(Vec<FieldError>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        field: impl Into<String>,
        error: ValidationKind,
        value: Option<String>,
    ) {
        self.0.push(FieldError {
            field: field.into(),
            error,
            value,
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Ok when no diagnostics were collected, otherwise the aggregate
    /// SchemaValidation error.
    pub fn into_result(self) -> Result<(), SchemaError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::SchemaValidation(self))
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

/// Top-level admission failures. `Msg` annotates an error with context while
/// preserving its identity; `root` strips annotations for matching.
#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    #[error("schema is empty")]
    EmptySchema,
    #[error("schema validation failed: {0}")]
    SchemaValidation(Diagnostics),
    #[error("invalid version {0:?}")]
    InvalidVersion(String),
    #[error("invalid kind {0:?}")]
    InvalidKind(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("{msg}")]
    Msg {
        msg: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Annotate with context, preserving the underlying error.
    pub fn with_msg(self, msg: impl Into<String>) -> Self {
        SchemaError::Msg {
            msg: msg.into(),
            source: Box::new(self),
        }
    }

    /// The error with any `Msg` annotations stripped.
    pub fn root(&self) -> &SchemaError {
        match self {
            SchemaError::Msg { source, .. } => source.root(),
            other => other,
        }
    }

    /// The collected diagnostics, when this is a SchemaValidation.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self.root() {
            SchemaError::SchemaValidation(diag) => Some(diag),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Diagnostics, SchemaError, ValidationKind};

    #[test]
    fn test_kinds_render_stable_strings() {
        assert_eq!(
            ValidationKind::ValueAboveMax.to_string(),
            "value is above maximum"
        );
        assert_eq!(
            ValidationKind::ValueBelowMin.to_string(),
            "value is below minimum"
        );
        assert_eq!(
            ValidationKind::InvalidStepValue.to_string(),
            "invalid step value"
        );
    }

    #[test]
    fn test_diagnostics_collect_in_order() {
        let mut diag = Diagnostics::new();
        diag.push("maxValue", ValidationKind::MaxValueLessThanMinValue, None);
        diag.push("step", ValidationKind::InvalidStepValue, Some("0".into()));
        assert_eq!(diag.len(), 2);
        assert_eq!(diag.first().unwrap().field, "maxValue");

        let err = diag.into_result().unwrap_err();
        assert!(matches!(err, SchemaError::SchemaValidation(_)));
    }

    #[test]
    fn test_msg_preserves_identity() {
        let err = SchemaError::EmptySchema.with_msg("while admitting resource");
        assert!(matches!(err.root(), SchemaError::EmptySchema));
        assert!(err.to_string().contains("while admitting resource"));
    }
}
